use std::io;
use std::path::Path;

use axum::Router;
use tokio::net::UnixListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse};
use tower_http::LatencyUnit;

mod config;
mod handlers;
mod health;
mod plugin;

pub use config::Config;
pub use plugin::PLUGIN_CONTENT_TYPE;

use crate::ServiceState;

const STATUS_PREFIX: &str = "/_status";

/// Plugin protocol routes plus `/_status` probes.
pub fn router(state: ServiceState) -> Router {
    Router::new()
        .merge(plugin::router(state.clone()))
        .nest(STATUS_PREFIX, health::router(state.clone()))
        .fallback(handlers::not_found_handler)
        .with_state(state)
}

/// Serve the plugin API on a unix socket until `shutdown_rx` fires.
///
/// A socket file left behind by an earlier run is replaced, and the socket
/// is removed again on the way out.
pub async fn run(
    config: Config,
    state: ServiceState,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<(), HttpServerError> {
    let socket_path = config.socket_path.clone();
    let log_level = config.log_level;
    let trace_layer = TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .include_headers(false)
                .level(log_level)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros));

    let router = router(state).layer(trace_layer);

    let listener = bind(&socket_path)?;
    tracing::info!(socket = %socket_path.display(), "plugin API listening");

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await;

    if let Err(e) = std::fs::remove_file(&socket_path) {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!(socket = %socket_path.display(), "failed to remove socket: {}", e);
        }
    }

    served.map_err(HttpServerError::ServingFailed)
}

fn bind(socket_path: &Path) -> Result<UnixListener, HttpServerError> {
    let bind_error = |source| HttpServerError::Bind {
        path: socket_path.display().to_string(),
        source,
    };

    match std::fs::remove_file(socket_path) {
        Ok(()) => tracing::info!(socket = %socket_path.display(), "removed stale socket"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(bind_error(e)),
    }
    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent).map_err(bind_error)?;
    }
    UnixListener::bind(socket_path).map_err(bind_error)
}

#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("failed to bind {path}: {source}")]
    Bind {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("an error occurred running the HTTP server: {0}")]
    ServingFailed(#[source] io::Error),
}
