//! System endpoints: health check and sync status.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::HealthResponse;
use crate::app_state::AppState;
use crate::service::SyncStatus;

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns version, push connection status, and the modem probe result when a modem address is configured. Always 200; `status` is `degraded` when a dependency is down.",
    responses(
        (status = 200, description = "Service health", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let modem = match state.modem_probe {
        Some(probe) => Some(probe.check().await),
        None => None,
    };
    (
        StatusCode::OK,
        Json(HealthResponse::new(state.client.status(), modem)),
    )
}

/// `GET /status` — Connection state and performance counters.
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "System",
    summary = "Sync status",
    description = "Returns connection status, reconnect attempts, heartbeat age, performance counters, and tracked subscriptions.",
    responses(
        (status = 200, description = "Current sync status", body = SyncStatus),
    )
)]
pub async fn status_handler(State(state): State<AppState>) -> Json<SyncStatus> {
    Json(state.client.sync_status().await)
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}

/// System routes mounted under /api/v1.
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/status", get(status_handler))
}
