use axum::response::IntoResponse;
use serde::Serialize;

use super::PluginResponse;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActivateResponse {
    pub implements: Vec<&'static str>,
}

#[tracing::instrument]
pub async fn handler() -> impl IntoResponse {
    tracing::info!("plugin activated");
    PluginResponse(ActivateResponse {
        implements: vec!["VolumeDriver"],
    })
}
