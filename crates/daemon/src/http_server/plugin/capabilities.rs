use axum::extract::State;
use serde::Serialize;

use common::orchestrator::Scope;

use super::PluginResponse;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CapabilitiesBody {
    pub scope: Scope,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CapabilitiesResponse {
    pub capabilities: CapabilitiesBody,
}

pub async fn handler(State(state): State<ServiceState>) -> PluginResponse<CapabilitiesResponse> {
    let capabilities = state.orchestrator().capabilities();
    PluginResponse(CapabilitiesResponse {
        capabilities: CapabilitiesBody {
            scope: capabilities.scope,
        },
    })
}

#[cfg(test)]
mod tests {
    use crate::http_server::plugin::tests::test_app;

    #[tokio::test]
    async fn reports_configured_scope() {
        let app = test_app();
        let (_, body) = app.post("/VolumeDriver.Capabilities", "").await;
        assert_eq!(body, serde_json::json!({"Capabilities": {"Scope": "global"}}));
    }
}
