use axum::extract::State;

use super::{EmptyResponse, NameRequest, PluginError, PluginJson, PluginResponse};
use crate::ServiceState;

pub async fn handler(
    State(state): State<ServiceState>,
    PluginJson(req): PluginJson<NameRequest>,
) -> Result<PluginResponse<EmptyResponse>, PluginError> {
    tracing::info!(name = %req.name, "remove volume");
    state.orchestrator().remove(&req.name).await?;
    Ok(PluginResponse(EmptyResponse::default()))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use common::testkit::StorageCall;

    use crate::http_server::plugin::tests::test_app;

    #[tokio::test]
    async fn removes_volume_and_remote_resources() {
        let app = test_app();
        app.create("web", &[]).await;

        let (status, _) = app.post("/VolumeDriver.Remove", r#"{"Name":"web"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(app.storage.count(StorageCall::DeleteExport), 1);
        assert_eq!(app.storage.count(StorageCall::DeleteDataContainer), 1);

        let (status, body) = app.post("/VolumeDriver.Remove", r#"{"Name":"web"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["Err"], "volume web not found");
    }

    #[tokio::test]
    async fn refuses_volume_in_use() {
        let app = test_app();
        app.create("web", &[]).await;
        app.post("/VolumeDriver.Mount", r#"{"Name":"web","ID":"c1"}"#)
            .await;

        let (status, body) = app.post("/VolumeDriver.Remove", r#"{"Name":"web"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["Err"], "volume web is in use by 1 consumer(s)");
        assert_eq!(app.storage.count(StorageCall::DeleteExport), 0);
    }
}
