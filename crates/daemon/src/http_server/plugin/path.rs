use axum::extract::State;

use super::{MountpointResponse, NameRequest, PluginError, PluginJson, PluginResponse};
use crate::ServiceState;

pub async fn handler(
    State(state): State<ServiceState>,
    PluginJson(req): PluginJson<NameRequest>,
) -> Result<PluginResponse<MountpointResponse>, PluginError> {
    let mountpoint = state.orchestrator().path(&req.name).await?;
    Ok(PluginResponse(MountpointResponse {
        mountpoint: mountpoint.display().to_string(),
    }))
}
