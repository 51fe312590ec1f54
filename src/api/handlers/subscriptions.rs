//! Subscription handlers: list, subscribe, unsubscribe.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get};
use axum::{Json, Router};

use crate::api::dto::{CommandAccepted, SubscribeRequest, SubscriptionsResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, SyncError};

/// `GET /subscriptions` — Tracked channels.
#[utoipa::path(
    get,
    path = "/api/v1/subscriptions",
    tag = "Subscriptions",
    summary = "List subscriptions",
    responses(
        (status = 200, description = "Tracked channels", body = SubscriptionsResponse),
    )
)]
pub async fn list_subscriptions(State(state): State<AppState>) -> Json<SubscriptionsResponse> {
    Json(SubscriptionsResponse {
        channels: state.client.subscriptions().await,
    })
}

/// `POST /subscriptions` — Track a channel.
///
/// # Errors
///
/// Returns [`SyncError::InvalidRequest`] for a blank channel.
#[utoipa::path(
    post,
    path = "/api/v1/subscriptions",
    tag = "Subscriptions",
    summary = "Subscribe to a channel",
    description = "Tracks the channel and sends a `subscribe` frame if connected. Tracked channels are replayed after every reconnect. Subscribing twice is a no-op.",
    request_body = SubscribeRequest,
    responses(
        (status = 202, description = "Subscription queued", body = CommandAccepted),
        (status = 400, description = "Blank channel", body = ErrorResponse),
    )
)]
pub async fn subscribe(
    State(state): State<AppState>,
    Json(req): Json<SubscribeRequest>,
) -> Result<impl IntoResponse, SyncError> {
    state.client.subscribe(req.channel.clone()).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(CommandAccepted::new("subscribe", Some(req.channel))),
    ))
}

/// `DELETE /subscriptions/{channel}` — Stop tracking a channel.
///
/// # Errors
///
/// Returns [`SyncError::InvalidRequest`] for a blank channel.
#[utoipa::path(
    delete,
    path = "/api/v1/subscriptions/{channel}",
    tag = "Subscriptions",
    summary = "Unsubscribe from a channel",
    params(("channel" = String, Path, description = "Channel name")),
    responses(
        (status = 202, description = "Unsubscription queued", body = CommandAccepted),
        (status = 400, description = "Blank channel", body = ErrorResponse),
    )
)]
pub async fn unsubscribe(
    State(state): State<AppState>,
    Path(channel): Path<String>,
) -> Result<impl IntoResponse, SyncError> {
    state.client.unsubscribe(channel.clone()).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(CommandAccepted::new("unsubscribe", Some(channel))),
    ))
}

/// Subscription routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/subscriptions", get(list_subscriptions).post(subscribe))
        .route("/subscriptions/{channel}", delete(unsubscribe))
}
