use std::collections::BTreeMap;

use axum::extract::State;
use serde::Deserialize;

use super::{EmptyResponse, PluginError, PluginJson, PluginResponse};
use crate::ServiceState;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateRequest {
    pub name: String,
    /// `docker volume create -o key=value` pairs; sent as `null` when empty.
    #[serde(default)]
    pub opts: Option<BTreeMap<String, String>>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    PluginJson(req): PluginJson<CreateRequest>,
) -> Result<PluginResponse<EmptyResponse>, PluginError> {
    let opts = req.opts.unwrap_or_default();
    tracing::info!(name = %req.name, ?opts, "create volume");

    state.orchestrator().create(&req.name, &opts).await?;
    Ok(PluginResponse(EmptyResponse::default()))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use common::testkit::StorageCall;

    use crate::http_server::plugin::tests::test_app;

    #[tokio::test]
    async fn creates_with_null_opts() {
        let app = test_app();
        let (status, body) = app
            .post("/VolumeDriver.Create", r#"{"Name":"web","Opts":null}"#)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({}));
        assert_eq!(app.storage.count(StorageCall::CreateDataContainer), 1);
    }

    #[tokio::test]
    async fn duplicate_create_reports_err() {
        let app = test_app();
        app.create("web", &[("size", "1GiB")]).await;

        let (status, body) = app
            .post("/VolumeDriver.Create", r#"{"Name":"web"}"#)
            .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["Err"], "volume web already exists");
    }

    #[tokio::test]
    async fn invalid_option_reports_err() {
        let app = test_app();
        let (status, body) = app
            .post(
                "/VolumeDriver.Create",
                r#"{"Name":"web","Opts":{"user-mapping-type":"squash"}}"#,
            )
            .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["Err"], "unsupported user mapping type: squash");
        assert!(app.storage.calls().is_empty());
    }
}
