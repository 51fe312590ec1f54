//! Sync client error types with HTTP status code mapping.
//!
//! [`SyncError`] is the central error type. Transport and parse failures
//! are handled inside the sync driver and only surface through observable
//! state; the remaining variants are returned to callers of the client
//! handle and the diagnostics API, where each maps to an HTTP status code
//! and a structured JSON error body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::CollectionKind;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "calls record not found: c42"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Error enum for the sync core, client handle, and diagnostics API.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                  |
/// |-----------|-----------------|------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request              |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server          | 500 / 503                    |
/// | 5000–5999 | Transport       | 502 Bad Gateway              |
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// Connection refused, closed, or timed out.
    #[error("transport error: {0}")]
    Transport(String),

    /// Inbound frame could not be decoded.
    #[error("malformed frame: {0}")]
    Parse(String),

    /// Automatic reconnection gave up.
    #[error("reconnect attempts exhausted after {attempts} tries")]
    ExhaustedRetries {
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// Operation needs a live connection.
    #[error("not connected")]
    NotConnected,

    /// The sync driver has stopped.
    #[error("sync client has shut down")]
    ClientClosed,

    /// A record was requested that is not in the collection.
    #[error("{collection} record not found: {id}")]
    NotFound {
        /// Collection searched.
        collection: CollectionKind,
        /// Requested id.
        id: String,
    },

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration value could not be used.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SyncError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::Parse(_) => 1002,
            Self::NotFound { .. } => 2001,
            Self::NotConnected => 2002,
            Self::ExhaustedRetries { .. } => 2003,
            Self::ClientClosed => 3001,
            Self::Config(_) => 3002,
            Self::Transport(_) => 5001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::Parse(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::NotConnected | Self::ExhaustedRetries { .. } => StatusCode::CONFLICT,
            Self::ClientClosed => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SyncError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl IntoResponse for SyncError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
