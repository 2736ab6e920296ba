use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::time::Duration;
use tokio::time::timeout;

use crate::ServiceState;

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Ready once the volume table can be read. A lifecycle call stuck on the
/// management service holds the table and shows up here as a timeout.
#[tracing::instrument(skip(state))]
pub async fn handler(State(state): State<ServiceState>) -> Response {
    match timeout(HEALTH_CHECK_TIMEOUT, state.orchestrator().list()).await {
        Ok(volumes) => {
            let msg = serde_json::json!({"status": "ok", "volumes": volumes.len()});
            (StatusCode::OK, Json(msg)).into_response()
        }
        Err(_) => {
            let msg = serde_json::json!({
                "status": "failure",
                "message": "health check timed out"
            });
            (StatusCode::SERVICE_UNAVAILABLE, Json(msg)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;

    use crate::http_server::plugin::tests::test_app;

    #[tokio::test]
    async fn reports_volume_count() {
        let app = test_app();
        app.create("web", &[]).await;

        let response = crate::http_server::router(app.state.clone())
            .oneshot(Request::get("/_status/readyz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["volumes"], 1);
    }

    #[tokio::test]
    async fn unknown_endpoint_is_not_found() {
        let app = test_app();
        let response = crate::http_server::router(app.state.clone())
            .oneshot(
                Request::post("/VolumeDriver.Snapshot")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
