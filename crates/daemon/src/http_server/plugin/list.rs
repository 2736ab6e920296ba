use axum::extract::State;
use serde::Serialize;

use super::PluginResponse;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListEntry {
    pub name: String,
    pub mountpoint: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListResponse {
    pub volumes: Vec<ListEntry>,
}

pub async fn handler(State(state): State<ServiceState>) -> PluginResponse<ListResponse> {
    let volumes = state
        .orchestrator()
        .list()
        .await
        .iter()
        .map(|v| ListEntry {
            name: v.name().to_owned(),
            mountpoint: v.mountpoint().display().to_string(),
        })
        .collect();
    PluginResponse(ListResponse { volumes })
}
