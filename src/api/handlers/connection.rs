//! Connection control and outbound message handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{CommandAccepted, ConnectRequest, SendMessageRequest};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, SyncError};

/// `POST /connection/connect` — Open the push connection.
///
/// # Errors
///
/// Returns [`SyncError::Config`] for a non-WebSocket endpoint.
#[utoipa::path(
    post,
    path = "/api/v1/connection/connect",
    tag = "Connection",
    summary = "Connect",
    description = "Connects to the given endpoint, or to the last or configured one. Resets the reconnect counter. A no-op while connected or connecting.",
    request_body = ConnectRequest,
    responses(
        (status = 202, description = "Connect queued", body = CommandAccepted),
        (status = 500, description = "Endpoint is not a ws:// or wss:// URL", body = ErrorResponse),
    )
)]
pub async fn connect(
    State(state): State<AppState>,
    Json(req): Json<ConnectRequest>,
) -> Result<impl IntoResponse, SyncError> {
    state.client.connect(req.endpoint.clone()).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(CommandAccepted::new("connect", req.endpoint)),
    ))
}

/// `POST /connection/disconnect` — Close the push connection.
///
/// # Errors
///
/// Returns [`SyncError::ClientClosed`] if the sync driver has stopped.
#[utoipa::path(
    post,
    path = "/api/v1/connection/disconnect",
    tag = "Connection",
    summary = "Disconnect",
    description = "Closes the connection and cancels any scheduled reconnect. Subscriptions stay tracked.",
    responses(
        (status = 202, description = "Disconnect queued", body = CommandAccepted),
    )
)]
pub async fn disconnect(State(state): State<AppState>) -> Result<impl IntoResponse, SyncError> {
    state.client.disconnect().await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(CommandAccepted::new("disconnect", None)),
    ))
}

/// `POST /messages` — Send a caller-defined message.
///
/// # Errors
///
/// Returns [`SyncError::NotConnected`] while the connection is down and
/// [`SyncError::InvalidRequest`] for a blank type.
#[utoipa::path(
    post,
    path = "/api/v1/messages",
    tag = "Connection",
    summary = "Send a message",
    description = "Forwards `{type, data, timestamp}` to the server. Fire-and-forget: no buffering, acknowledgement, or retry.",
    request_body = SendMessageRequest,
    responses(
        (status = 202, description = "Message queued", body = CommandAccepted),
        (status = 400, description = "Blank message type", body = ErrorResponse),
        (status = 409, description = "Not connected", body = ErrorResponse),
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, SyncError> {
    state
        .client
        .send_message(req.msg_type.clone(), req.data)
        .await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(CommandAccepted::new("send_message", Some(req.msg_type))),
    ))
}

/// Connection routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/connection/connect", post(connect))
        .route("/connection/disconnect", post(disconnect))
        .route("/messages", post(send_message))
}
