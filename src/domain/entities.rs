//! Entity records tracked by the synchronizer.
//!
//! Each entity is keyed by a stable string identifier assigned by the
//! server. Wire encoding is camelCase JSON; every field other than the id
//! (and the status for calls and agents) defaults when absent so that
//! partial frames still apply as full replacements.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// The six independent collections kept by the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    /// Live calls.
    Calls,
    /// Agents and their presence.
    Agents,
    /// System alerts (capped, newest first).
    Alerts,
    /// Dashboard metrics.
    Metrics,
    /// Queue occupancy.
    Queues,
    /// Outbound campaign progress.
    Campaigns,
}

impl CollectionKind {
    /// Returns the collection name as used on the wire and in channel names.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Calls => "calls",
            Self::Agents => "agents",
            Self::Alerts => "alerts",
            Self::Metrics => "metrics",
            Self::Queues => "queues",
            Self::Campaigns => "campaigns",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record stored in one of the keyed collections.
pub trait Entity: Clone + fmt::Debug + Send + Sync + 'static {
    /// Collection this entity type lives in.
    const KIND: CollectionKind;

    /// Stable identifier used as the collection key.
    fn id(&self) -> &str;
}

// ── Calls ────────────────────────────────────────────────────────────────

/// Lifecycle status of a live call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    /// Dialing or ringing on the far end.
    Ringing,
    /// Agent and customer are talking.
    Connected,
    /// Customer placed on hold.
    OnHold,
    /// Being transferred to another agent or queue.
    Transferring,
    /// Call ended normally.
    Completed,
    /// Call could not be established.
    Failed,
    /// Customer hung up before being served.
    Abandoned,
}

impl CallStatus {
    /// Returns `true` for statuses after which the call leaves the live view.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Abandoned)
    }
}

/// Sentiment estimate produced by the speech analytics pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    /// Positive tone.
    Positive,
    /// Neutral tone.
    Neutral,
    /// Negative tone.
    Negative,
}

/// Who spoke a transcription segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// The call-center agent.
    Agent,
    /// The customer.
    Customer,
}

/// One segment of a live transcription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSegment {
    /// Speaker of this segment.
    pub speaker: Speaker,
    /// Transcribed text.
    pub text: String,
    /// When the segment was spoken.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Recognizer confidence in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// A call currently in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LiveCall {
    /// Call identifier.
    pub id: String,
    /// Current status.
    pub status: CallStatus,
    /// Elapsed seconds since the call connected. Fractional values on the
    /// wire are rounded.
    #[serde(default, deserialize_with = "whole_seconds")]
    pub duration: u64,
    /// Customer phone number.
    #[serde(default)]
    pub phone_number: String,
    /// Customer display name, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    /// Handling agent (weak reference into the agents collection).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    /// Queue the call came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_id: Option<String>,
    /// Campaign that originated the call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    /// Latest sentiment estimate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    /// Transcription so far.
    #[serde(default)]
    pub transcription: Vec<TranscriptSegment>,
    /// When the call started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
}

fn whole_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let seconds = f64::deserialize(deserializer)?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(<D::Error as serde::de::Error>::custom(format!(
            "duration must be a non-negative number, got {seconds}"
        )));
    }
    Ok(seconds.round() as u64)
}

impl Entity for LiveCall {
    const KIND: CollectionKind = CollectionKind::Calls;

    fn id(&self) -> &str {
        &self.id
    }
}

// ── Agents ───────────────────────────────────────────────────────────────

/// Presence status of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Ready to take calls.
    Available,
    /// Handling a call.
    OnCall,
    /// Wrapping up after a call.
    AfterCallWork,
    /// On break.
    Break,
    /// Logged off.
    Offline,
}

/// Rolling performance figures for an agent's shift.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentPerformance {
    /// Calls handled this shift.
    pub calls_handled: u32,
    /// Average handle time in seconds.
    pub avg_handle_time: f64,
    /// Customer satisfaction score.
    pub satisfaction_score: f64,
    /// Share of outcomes counted as conversions, in percent.
    pub conversion_rate: f64,
}

/// Scheduled shift boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    /// Shift start.
    pub start: DateTime<Utc>,
    /// Shift end.
    pub end: DateTime<Utc>,
}

/// A logged-in agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LiveAgent {
    /// Agent identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Presence status.
    pub status: AgentStatus,
    /// Call being handled (weak reference into the calls collection).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_call: Option<String>,
    /// Performance figures.
    #[serde(default)]
    pub performance: AgentPerformance,
    /// Current shift.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift: Option<Shift>,
    /// Skill tags used for routing.
    #[serde(default)]
    pub skills: Vec<String>,
}

impl Entity for LiveAgent {
    const KIND: CollectionKind = CollectionKind::Agents;

    fn id(&self) -> &str {
        &self.id
    }
}

// ── Alerts ───────────────────────────────────────────────────────────────

/// Alert severity.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    /// Informational. Assumed when a frame omits the severity.
    #[default]
    Info,
    /// Needs attention.
    Warning,
    /// Something failed.
    Error,
    /// Service affecting.
    Critical,
}

/// An operational alert raised by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemAlert {
    /// Alert identifier.
    pub id: String,
    /// Severity.
    #[serde(default)]
    pub severity: AlertSeverity,
    /// Short title.
    #[serde(default)]
    pub title: String,
    /// Detail message.
    #[serde(default)]
    pub message: String,
    /// Whether an operator acknowledged it.
    #[serde(default)]
    pub acknowledged: bool,
    /// When the alert was raised.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Originating subsystem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Entity for SystemAlert {
    const KIND: CollectionKind = CollectionKind::Alerts;

    fn id(&self) -> &str {
        &self.id
    }
}

// ── Metrics ──────────────────────────────────────────────────────────────

/// Direction a metric is moving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    /// Increasing.
    Up,
    /// Decreasing.
    Down,
    /// Flat.
    #[default]
    Stable,
}

/// A single dashboard metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LiveMetric {
    /// Metric identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Current value.
    #[serde(default)]
    pub value: f64,
    /// Value at the previous sample, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_value: Option<f64>,
    /// Direction of change.
    #[serde(default)]
    pub trend: Trend,
    /// Alerting threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    /// Display unit (e.g. `"%"`, `"s"`).
    #[serde(default)]
    pub unit: String,
}

impl LiveMetric {
    /// Returns `true` when a threshold is set and the value exceeds it.
    #[must_use]
    pub fn is_over_threshold(&self) -> bool {
        self.threshold.is_some_and(|t| self.value > t)
    }
}

impl Entity for LiveMetric {
    const KIND: CollectionKind = CollectionKind::Metrics;

    fn id(&self) -> &str {
        &self.id
    }
}

// ── Queues ───────────────────────────────────────────────────────────────

/// Occupancy of an inbound call queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    /// Queue identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Callers currently waiting.
    #[serde(default)]
    pub waiting: u32,
    /// Agents able to take calls from this queue.
    #[serde(default)]
    pub available_agents: u32,
    /// Average wait in seconds.
    #[serde(default)]
    pub avg_wait_time: f64,
    /// Longest current wait in seconds.
    #[serde(default)]
    pub longest_wait: f64,
    /// Share of calls answered within target, in percent.
    #[serde(default)]
    pub service_level: f64,
}

impl Entity for QueueStatus {
    const KIND: CollectionKind = CollectionKind::Queues;

    fn id(&self) -> &str {
        &self.id
    }
}

// ── Campaigns ────────────────────────────────────────────────────────────

/// Run state of an outbound campaign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CampaignState {
    /// Dialing.
    #[default]
    Active,
    /// Paused by an operator.
    Paused,
    /// All contacts processed.
    Completed,
}

/// Dialing progress counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignProgress {
    /// Contacts in the list.
    pub total_contacts: u32,
    /// Contacts dialed so far.
    pub dialed: u32,
    /// Calls that reached a person.
    pub connected: u32,
    /// Contacts fully worked.
    pub completed: u32,
}

/// Campaign outcome ratios, in percent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignPerformance {
    /// Connected / dialed.
    pub contact_rate: f64,
    /// Conversions / connected.
    pub conversion_rate: f64,
    /// Abandoned / dialed.
    pub abandon_rate: f64,
}

/// Live status of an outbound campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignStatus {
    /// Campaign identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Run state.
    #[serde(default)]
    pub state: CampaignState,
    /// Progress counters.
    #[serde(default)]
    pub progress: CampaignProgress,
    /// Outcome ratios.
    #[serde(default)]
    pub performance: CampaignPerformance,
}

impl Entity for CampaignStatus {
    const KIND: CollectionKind = CollectionKind::Campaigns;

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn minimal_call_frame_deserializes() {
        let json = r#"{"id":"c1","status":"ringing"}"#;
        let Ok(call) = serde_json::from_str::<LiveCall>(json) else {
            panic!("minimal call should parse");
        };
        assert_eq!(call.id(), "c1");
        assert_eq!(call.status, CallStatus::Ringing);
        assert_eq!(call.duration, 0);
        assert!(call.transcription.is_empty());
    }

    #[test]
    fn call_fields_are_camel_case() {
        let json = r#"{
            "id": "c2",
            "status": "on_hold",
            "duration": 12,
            "phoneNumber": "+15550100",
            "agentId": "a1",
            "sentiment": "negative",
            "transcription": [{"speaker": "customer", "text": "hello"}]
        }"#;
        let Ok(call) = serde_json::from_str::<LiveCall>(json) else {
            panic!("call should parse");
        };
        assert_eq!(call.agent_id.as_deref(), Some("a1"));
        assert_eq!(call.sentiment, Some(Sentiment::Negative));
        assert_eq!(call.transcription.len(), 1);
    }

    #[test]
    fn terminal_call_statuses() {
        assert!(CallStatus::Completed.is_terminal());
        assert!(CallStatus::Failed.is_terminal());
        assert!(CallStatus::Abandoned.is_terminal());
        assert!(!CallStatus::Ringing.is_terminal());
        assert!(!CallStatus::OnHold.is_terminal());
    }

    #[test]
    fn call_without_status_is_rejected() {
        assert!(serde_json::from_str::<LiveCall>(r#"{"id":"c1"}"#).is_err());
    }

    #[test]
    fn metric_threshold_check() {
        let metric = LiveMetric {
            id: "m1".to_string(),
            name: "Abandon rate".to_string(),
            value: 7.5,
            previous_value: None,
            trend: Trend::Up,
            threshold: Some(5.0),
            unit: "%".to_string(),
        };
        assert!(metric.is_over_threshold());
        let calm = LiveMetric {
            threshold: None,
            ..metric
        };
        assert!(!calm.is_over_threshold());
    }

    #[test]
    fn fractional_duration_is_rounded() {
        let json = r#"{"id":"c1","status":"connected","duration":45.0}"#;
        let Ok(call) = serde_json::from_str::<LiveCall>(json) else {
            panic!("float duration should parse");
        };
        assert_eq!(call.duration, 45);
        let json = r#"{"id":"c1","status":"connected","duration":12.6}"#;
        let Ok(call) = serde_json::from_str::<LiveCall>(json) else {
            panic!("fractional duration should parse");
        };
        assert_eq!(call.duration, 13);
        assert!(
            serde_json::from_str::<LiveCall>(r#"{"id":"c1","status":"connected","duration":-3}"#)
                .is_err()
        );
    }

    #[test]
    fn alert_without_severity_defaults_to_info() {
        let Ok(alert) = serde_json::from_str::<SystemAlert>(r#"{"id":"al1","title":"x"}"#) else {
            panic!("alert without severity should parse");
        };
        assert_eq!(alert.severity, AlertSeverity::Info);
        assert!(!alert.acknowledged);
    }

    #[test]
    fn entity_kinds_match_collections() {
        assert_eq!(LiveCall::KIND, CollectionKind::Calls);
        assert_eq!(SystemAlert::KIND, CollectionKind::Alerts);
        assert_eq!(CampaignStatus::KIND, CollectionKind::Campaigns);
    }

    #[test]
    fn collection_kind_names() {
        assert_eq!(CollectionKind::Calls.to_string(), "calls");
        let Ok(kind) = serde_json::from_str::<CollectionKind>("\"campaigns\"") else {
            panic!("kind should parse");
        };
        assert_eq!(kind, CollectionKind::Campaigns);
    }
}
