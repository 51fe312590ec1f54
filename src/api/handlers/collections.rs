//! Read-only snapshot handlers for the live collections and event log.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::EventsQuery;
use crate::app_state::AppState;
use crate::domain::{
    CampaignStatus, LiveAgent, LiveCall, LiveMetric, LoggedEvent, QueueStatus, SystemAlert,
};
use crate::error::{ErrorResponse, SyncError};

/// `GET /calls` — Live calls.
#[utoipa::path(
    get,
    path = "/api/v1/calls",
    tag = "Collections",
    summary = "List live calls",
    description = "Snapshot of every call currently tracked. Calls that reached a terminal status are no longer listed.",
    responses(
        (status = 200, description = "Live calls", body = Vec<LiveCall>),
    )
)]
pub async fn list_calls(State(state): State<AppState>) -> Json<Vec<LiveCall>> {
    Json(state.client.calls().await)
}

/// `GET /calls/{id}` — One live call.
///
/// # Errors
///
/// Returns [`SyncError::NotFound`] if the call is not tracked.
#[utoipa::path(
    get,
    path = "/api/v1/calls/{id}",
    tag = "Collections",
    summary = "Get a live call",
    params(("id" = String, Path, description = "Call id")),
    responses(
        (status = 200, description = "Call record", body = LiveCall),
        (status = 404, description = "Call not found", body = ErrorResponse),
    )
)]
pub async fn get_call(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LiveCall>, SyncError> {
    Ok(Json(state.client.call(&id).await?))
}

/// `GET /agents` — Agents.
#[utoipa::path(
    get,
    path = "/api/v1/agents",
    tag = "Collections",
    summary = "List agents",
    responses(
        (status = 200, description = "Agents", body = Vec<LiveAgent>),
    )
)]
pub async fn list_agents(State(state): State<AppState>) -> Json<Vec<LiveAgent>> {
    Json(state.client.agents().await)
}

/// `GET /agents/{id}` — One agent.
///
/// # Errors
///
/// Returns [`SyncError::NotFound`] if the agent is not known.
#[utoipa::path(
    get,
    path = "/api/v1/agents/{id}",
    tag = "Collections",
    summary = "Get an agent",
    params(("id" = String, Path, description = "Agent id")),
    responses(
        (status = 200, description = "Agent record", body = LiveAgent),
        (status = 404, description = "Agent not found", body = ErrorResponse),
    )
)]
pub async fn get_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LiveAgent>, SyncError> {
    Ok(Json(state.client.agent(&id).await?))
}

/// `GET /alerts` — Alerts, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/alerts",
    tag = "Collections",
    summary = "List alerts",
    description = "Bounded alert feed, newest first. The oldest alerts are evicted once the feed is full.",
    responses(
        (status = 200, description = "Alerts", body = Vec<SystemAlert>),
    )
)]
pub async fn list_alerts(State(state): State<AppState>) -> Json<Vec<SystemAlert>> {
    Json(state.client.alerts().await)
}

/// `GET /metrics` — Latest metric samples.
#[utoipa::path(
    get,
    path = "/api/v1/metrics",
    tag = "Collections",
    summary = "List metrics",
    responses(
        (status = 200, description = "Metrics", body = Vec<LiveMetric>),
    )
)]
pub async fn list_metrics(State(state): State<AppState>) -> Json<Vec<LiveMetric>> {
    Json(state.client.metrics().await)
}

/// `GET /queues` — Queue occupancy.
#[utoipa::path(
    get,
    path = "/api/v1/queues",
    tag = "Collections",
    summary = "List queues",
    responses(
        (status = 200, description = "Queues", body = Vec<QueueStatus>),
    )
)]
pub async fn list_queues(State(state): State<AppState>) -> Json<Vec<QueueStatus>> {
    Json(state.client.queues().await)
}

/// `GET /campaigns` — Campaign progress.
#[utoipa::path(
    get,
    path = "/api/v1/campaigns",
    tag = "Collections",
    summary = "List campaigns",
    responses(
        (status = 200, description = "Campaigns", body = Vec<CampaignStatus>),
    )
)]
pub async fn list_campaigns(State(state): State<AppState>) -> Json<Vec<CampaignStatus>> {
    Json(state.client.campaigns().await)
}

/// `GET /events` — Event log, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "Collections",
    summary = "Recent events",
    description = "Inbound and outbound frames recorded by the sync client, newest first.",
    params(EventsQuery),
    responses(
        (status = 200, description = "Logged events", body = Vec<LoggedEvent>),
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Json<Vec<LoggedEvent>> {
    Json(state.client.events(query.clamped_limit()).await)
}

/// Collection routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/calls", get(list_calls))
        .route("/calls/{id}", get(get_call))
        .route("/agents", get(list_agents))
        .route("/agents/{id}", get(get_agent))
        .route("/alerts", get(list_alerts))
        .route("/metrics", get(list_metrics))
        .route("/queues", get(list_queues))
        .route("/campaigns", get(list_campaigns))
        .route("/events", get(list_events))
}
