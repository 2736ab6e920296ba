use axum::extract::State;
use serde::Serialize;

use common::volume::{Volume, VolumeStatus};

use super::{NameRequest, PluginError, PluginJson, PluginResponse};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VolumeDescriptor {
    pub name: String,
    pub mountpoint: String,
    pub status: VolumeStatus,
}

impl From<&Volume> for VolumeDescriptor {
    fn from(volume: &Volume) -> Self {
        Self {
            name: volume.name().to_owned(),
            mountpoint: volume.mountpoint().display().to_string(),
            status: volume.status(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetResponse {
    pub volume: VolumeDescriptor,
}

pub async fn handler(
    State(state): State<ServiceState>,
    PluginJson(req): PluginJson<NameRequest>,
) -> Result<PluginResponse<GetResponse>, PluginError> {
    let volume = state.orchestrator().get(&req.name).await?;
    Ok(PluginResponse(GetResponse {
        volume: VolumeDescriptor::from(&volume),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::http_server::plugin::tests::test_app;

    #[tokio::test]
    async fn reports_backing_resources() {
        let app = test_app();
        app.create("db1", &[("size", "50GiB"), ("user-mapping-type", "remap_root")])
            .await;
        app.post("/VolumeDriver.Mount", r#"{"Name":"db1","ID":"c1"}"#)
            .await;

        let (status, body) = app.post("/VolumeDriver.Get", r#"{"Name":"db1"}"#).await;
        assert_eq!(status, StatusCode::OK);
        let volume = &body["Volume"];
        assert_eq!(volume["Name"], "db1");
        assert_eq!(
            volume["Mountpoint"],
            app.root.path().join("volumes/db1").display().to_string()
        );
        let status = &volume["Status"];
        assert_eq!(status["data_container"], "db1");
        assert_eq!(status["export"], "root");
        assert_eq!(status["quota"], "50GiB");
        assert_eq!(status["user_mapping"], "remap_root");
        assert_eq!(status["active_consumers"], 1);
        assert_eq!(status["state"], "mounted");
    }

    #[tokio::test]
    async fn path_of_unknown_volume_reports_err() {
        let app = test_app();
        let (status, body) = app.post("/VolumeDriver.Path", r#"{"Name":"ghost"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["Err"], "volume ghost not found");
    }
}
