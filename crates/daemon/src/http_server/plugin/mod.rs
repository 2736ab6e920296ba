//! Docker volume plugin protocol, v1.
//!
//! Every route is a `POST` carrying a JSON body, whatever the declared
//! content type. Failures answer `500` with `{"Err": "<message>"}`.

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use common::orchestrator::OrchestratorError;

use crate::ServiceState;

mod activate;
mod capabilities;
mod create;
mod get;
mod list;
mod mount;
mod path;
mod remove;
mod unmount;

pub const PLUGIN_CONTENT_TYPE: &str = "application/vnd.docker.plugins.v1.2+json";

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/Plugin.Activate", post(activate::handler))
        .route("/VolumeDriver.Create", post(create::handler))
        .route("/VolumeDriver.Remove", post(remove::handler))
        .route("/VolumeDriver.Mount", post(mount::handler))
        .route("/VolumeDriver.Unmount", post(unmount::handler))
        .route("/VolumeDriver.Path", post(path::handler))
        .route("/VolumeDriver.Get", post(get::handler))
        .route("/VolumeDriver.List", post(list::handler))
        .route("/VolumeDriver.Capabilities", post(capabilities::handler))
        .with_state(state)
}

/// JSON request body, decoded regardless of `Content-Type`. An empty body
/// reads as `{}`.
#[derive(Debug, Clone)]
pub struct PluginJson<T>(pub T);

impl<S, T> FromRequest<S> for PluginJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = PluginError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| PluginError::BadRequest(e.body_text()))?;
        let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &bytes
        };
        serde_json::from_slice(body)
            .map(PluginJson)
            .map_err(|e| PluginError::BadRequest(format!("invalid request body: {}", e)))
    }
}

/// JSON response carrying the plugin protocol's content type.
#[derive(Debug, Clone)]
pub struct PluginResponse<T>(pub T);

impl<T: Serialize> IntoResponse for PluginResponse<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(body) => plugin_json(StatusCode::OK, body),
            Err(e) => PluginError::Encode(e).into_response(),
        }
    }
}

fn plugin_json(status: StatusCode, body: Vec<u8>) -> Response {
    (
        status,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static(PLUGIN_CONTENT_TYPE),
        )],
        body,
    )
        .into_response()
}

/// Requests that only name a volume.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NameRequest {
    pub name: String,
}

/// Mount and unmount also carry the id of the requesting container.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MountRequest {
    pub name: String,
    #[serde(rename = "ID", default)]
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EmptyResponse {}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MountpointResponse {
    pub mountpoint: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorBody {
    err: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
    #[error("failed to encode response: {0}")]
    Encode(serde_json::Error),
}

impl IntoResponse for PluginError {
    fn into_response(self) -> Response {
        let status = match &self {
            PluginError::BadRequest(_) => StatusCode::BAD_REQUEST,
            PluginError::Orchestrator(_) | PluginError::Encode(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        tracing::error!(%status, error = %self, "plugin request failed");

        let body = serde_json::to_vec(&ErrorBody {
            err: self.to_string(),
        })
        .unwrap_or_else(|_| br#"{"Err":"internal error"}"#.to_vec());
        plugin_json(status, body)
    }
}
