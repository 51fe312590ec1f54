//! Response bodies for system endpoints.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::service::ModemHealth;
use crate::ws::ConnectionStatus;

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `"healthy"` when the push connection is up and the modem, if probed,
    /// is reachable; `"degraded"` otherwise.
    pub status: String,
    /// Response time.
    pub timestamp: DateTime<Utc>,
    /// Crate version.
    pub version: String,
    /// Push connection status.
    pub connection: ConnectionStatus,
    /// Modem probe result, when a modem address is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modem: Option<ModemHealth>,
}

impl HealthResponse {
    /// Builds a response, deriving the overall status from its parts.
    #[must_use]
    pub fn new(connection: ConnectionStatus, modem: Option<ModemHealth>) -> Self {
        let modem_ok = modem.as_ref().is_none_or(|m| m.reachable);
        let healthy = connection == ConnectionStatus::Connected && modem_ok;
        Self {
            status: if healthy { "healthy" } else { "degraded" }.to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            connection,
            modem,
        }
    }
}

/// Response body for `GET /api/v1/subscriptions`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubscriptionsResponse {
    /// Tracked channels in sorted order.
    pub channels: Vec<String>,
}
