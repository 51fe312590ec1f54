//! Wire messages: inbound server frames and the outbound envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::entities::{
    CampaignStatus, CollectionKind, LiveAgent, LiveCall, LiveMetric, QueueStatus, SystemAlert,
};
use crate::domain::synchronizer::EntityUpdate;
use crate::error::SyncError;

/// Payload of an `entity_removed` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRemoval {
    /// Collection holding the record.
    pub collection: CollectionKind,
    /// Record id.
    pub id: String,
}

/// Payload of a `pong` frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PongPayload {
    /// Round-trip latency in milliseconds as measured by the server.
    pub latency: f64,
}

/// Every frame the push server may send, tagged by `type` with the
/// payload under `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerFrame {
    /// A call was created or changed.
    CallUpdate(LiveCall),
    /// An agent was created or changed.
    AgentUpdate(LiveAgent),
    /// An alert was raised or changed.
    SystemAlert(SystemAlert),
    /// A metric was sampled.
    MetricUpdate(LiveMetric),
    /// A queue's occupancy changed.
    QueueUpdate(QueueStatus),
    /// A campaign's progress changed.
    CampaignUpdate(CampaignStatus),
    /// A record was deleted server-side.
    EntityRemoved(EntityRemoval),
    /// Liveness signal with no payload.
    Heartbeat,
    /// Reply to a keepalive ping.
    Pong(PongPayload),
}

impl ServerFrame {
    /// Returns the frame type as a static string slice.
    #[must_use]
    pub const fn type_str(&self) -> &'static str {
        match self {
            Self::CallUpdate(_) => "call_update",
            Self::AgentUpdate(_) => "agent_update",
            Self::SystemAlert(_) => "system_alert",
            Self::MetricUpdate(_) => "metric_update",
            Self::QueueUpdate(_) => "queue_update",
            Self::CampaignUpdate(_) => "campaign_update",
            Self::EntityRemoved(_) => "entity_removed",
            Self::Heartbeat => "heartbeat",
            Self::Pong(_) => "pong",
        }
    }

    /// Converts entity frames into the matching synchronizer update.
    /// Control frames (`heartbeat`, `pong`) yield `None`.
    #[must_use]
    pub fn into_entity_update(self) -> Option<EntityUpdate> {
        match self {
            Self::CallUpdate(call) => Some(EntityUpdate::Call(call)),
            Self::AgentUpdate(agent) => Some(EntityUpdate::Agent(agent)),
            Self::SystemAlert(alert) => Some(EntityUpdate::Alert(alert)),
            Self::MetricUpdate(metric) => Some(EntityUpdate::Metric(metric)),
            Self::QueueUpdate(queue) => Some(EntityUpdate::Queue(queue)),
            Self::CampaignUpdate(campaign) => Some(EntityUpdate::Campaign(campaign)),
            Self::EntityRemoved(EntityRemoval { collection, id }) => {
                Some(EntityUpdate::Remove { collection, id })
            }
            Self::Heartbeat | Self::Pong(_) => None,
        }
    }
}

/// Outbound message envelope.
///
/// Sent fire-and-forget: the transport forwards it with no local
/// buffering, acknowledgment, or retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OutboundMessage {
    /// Message type (e.g. `"subscribe"`, `"transfer_call"`).
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Type-specific payload.
    pub data: serde_json::Value,
    /// ISO-8601 send timestamp.
    pub timestamp: DateTime<Utc>,
}

impl OutboundMessage {
    /// Creates a caller-defined message.
    #[must_use]
    pub fn new(msg_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            msg_type: msg_type.into(),
            data,
            timestamp: Utc::now(),
        }
    }

    /// `subscribe` request for `channel`.
    #[must_use]
    pub fn subscribe(channel: &str) -> Self {
        Self::new("subscribe", serde_json::json!({ "channel": channel }))
    }

    /// `unsubscribe` request for `channel`.
    #[must_use]
    pub fn unsubscribe(channel: &str) -> Self {
        Self::new("unsubscribe", serde_json::json!({ "channel": channel }))
    }

    /// Keepalive `ping` carrying the local send time in Unix millis.
    #[must_use]
    pub fn ping(now: DateTime<Utc>) -> Self {
        Self {
            msg_type: "ping".to_string(),
            data: serde_json::json!({ "timestamp": now.timestamp_millis() }),
            timestamp: now,
        }
    }

    /// Encodes the message as a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Parse`] if the payload cannot be serialized.
    pub fn to_json(&self) -> Result<String, SyncError> {
        Ok(serde_json::to_string(self)?)
    }
}
