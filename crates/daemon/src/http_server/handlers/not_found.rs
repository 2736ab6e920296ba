use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Unknown endpoints answer in the plugin protocol's error shape so the
/// host runtime can tell an unsupported call from a failed one.
pub async fn not_found_handler(uri: Uri) -> Response {
    tracing::debug!(path = %uri.path(), "unknown endpoint");
    let err_msg = serde_json::json!({"Err": "not found"});
    (StatusCode::NOT_FOUND, Json(err_msg)).into_response()
}
