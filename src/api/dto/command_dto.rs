//! Request bodies and query parameters for command endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Maximum number of event log entries returned per request.
pub const MAX_EVENTS_LIMIT: usize = 1_000;

/// Request body for `POST /api/v1/subscriptions`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubscribeRequest {
    /// Channel name (e.g. `"calls"`, `"queue:support"`).
    pub channel: String,
}

/// Request body for `POST /api/v1/connection/connect`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ConnectRequest {
    /// Endpoint to connect to. Defaults to the last or configured endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Request body for `POST /api/v1/messages`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    /// Message type (e.g. `"transfer_call"`).
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Type-specific payload.
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Query parameters for `GET /api/v1/events`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct EventsQuery {
    /// Maximum entries to return (1-1000). Defaults to 50.
    #[serde(default = "default_events_limit")]
    pub limit: usize,
}

fn default_events_limit() -> usize {
    50
}

impl EventsQuery {
    /// Limit clamped to `1..=MAX_EVENTS_LIMIT`.
    #[must_use]
    pub fn clamped_limit(&self) -> usize {
        self.limit.clamp(1, MAX_EVENTS_LIMIT)
    }
}

/// Acknowledgement for a command handed to the sync driver.
///
/// Commands are asynchronous: acceptance means the driver queued the
/// request, not that the server received anything.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CommandAccepted {
    /// Command name (e.g. `"subscribe"`).
    pub command: String,
    /// Channel, endpoint, or message type the command targets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl CommandAccepted {
    /// Builds an acknowledgement.
    #[must_use]
    pub fn new(command: &str, target: Option<String>) -> Self {
        Self {
            command: command.to_string(),
            target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_limit_is_clamped() {
        assert_eq!(EventsQuery { limit: 0 }.clamped_limit(), 1);
        assert_eq!(EventsQuery { limit: 20 }.clamped_limit(), 20);
        assert_eq!(EventsQuery { limit: 50_000 }.clamped_limit(), MAX_EVENTS_LIMIT);
    }

    #[test]
    fn send_message_uses_type_key() {
        let parsed: Result<SendMessageRequest, _> =
            serde_json::from_str(r#"{"type":"transfer_call","data":{"callId":"c1"}}"#);
        assert!(parsed.is_ok_and(|req| req.msg_type == "transfer_call"));
    }

    #[test]
    fn connect_request_endpoint_is_optional() {
        let parsed: Result<ConnectRequest, _> = serde_json::from_str("{}");
        assert!(parsed.is_ok_and(|req| req.endpoint.is_none()));
    }
}
