//! HTTP server bootstrap for the visitor-facing surface.
//!
//! Builds the axum router, binds the configured port, and serves until
//! the process cancellation token fires.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{AppError, Result};

use super::routes::{self, AppState};

/// Build the application router over shared state.
#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/notify", post(routes::notify))
        .route("/check-command", get(routes::check_command))
        .route("/send-message", post(routes::send_message))
        .route("/track-ip", post(routes::track_ip))
        .with_state(state)
}

/// Serve the HTTP surface on `config.http_port` until cancelled.
///
/// # Errors
///
/// Returns `AppError::Http` if the server fails to bind or serve.
pub async fn serve(state: Arc<AppState>, ct: CancellationToken) -> Result<()> {
    let bind = SocketAddr::from(([0, 0, 0, 0], state.config.http_port));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|err| AppError::Http(format!("failed to bind on {bind}: {err}")))?;

    info!(%bind, "starting visitor HTTP surface");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { ct.cancelled().await })
    .await
    .map_err(|err| AppError::Http(format!("server error: {err}")))?;

    info!("visitor HTTP surface shut down");
    Ok(())
}
