use axum::extract::State;

use super::{EmptyResponse, MountRequest, PluginError, PluginJson, PluginResponse};
use crate::ServiceState;

pub async fn handler(
    State(state): State<ServiceState>,
    PluginJson(req): PluginJson<MountRequest>,
) -> Result<PluginResponse<EmptyResponse>, PluginError> {
    tracing::info!(name = %req.name, id = %req.id, "unmount volume");
    state.orchestrator().unmount(&req.name).await?;
    Ok(PluginResponse(EmptyResponse::default()))
}
