use axum::extract::State;

use super::{MountRequest, MountpointResponse, PluginError, PluginJson, PluginResponse};
use crate::ServiceState;

pub async fn handler(
    State(state): State<ServiceState>,
    PluginJson(req): PluginJson<MountRequest>,
) -> Result<PluginResponse<MountpointResponse>, PluginError> {
    tracing::info!(name = %req.name, id = %req.id, "mount volume");
    let mountpoint = state.orchestrator().mount(&req.name).await?;
    Ok(PluginResponse(MountpointResponse {
        mountpoint: mountpoint.display().to_string(),
    }))
}
