//! Aggregate sync state and the inbound dispatch pipeline.
//!
//! [`SyncState`] bundles the connection manager, subscription registry,
//! entity synchronizer, event log, and performance monitor. Every inbound
//! frame flows through [`SyncState::handle_inbound`]: decode → dispatch
//! by type → apply to one collection → record in the event log → update
//! counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::SyncConfig;
use crate::domain::{
    Direction, EntitySynchronizer, EventLog, LoggedEvent, PerformanceMonitor, PerformanceSnapshot,
    StoreChange,
};
use crate::error::SyncError;
use crate::ws::{
    ConnectionManager, ConnectionStatus, OutboundMessage, ReconnectPolicy, RetryPlan,
    ServerFrame, SubscriptionRegistry,
};

/// What handling one inbound frame did.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundOutcome {
    /// An entity collection changed.
    Applied(StoreChange),
    /// Entity frame with no effect (removal of an absent id).
    Unchanged,
    /// Heartbeat recorded.
    Heartbeat,
    /// Latency sample recorded, in milliseconds.
    Latency(f64),
    /// Frame could not be decoded and was dropped.
    Dropped(SyncError),
}

/// Connection and counter summary for dashboards and diagnostics.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SyncStatus {
    /// Connection status.
    pub status: ConnectionStatus,
    /// Current or last endpoint.
    pub endpoint: Option<String>,
    /// Automatic reconnect attempts since the last successful open.
    pub reconnect_attempts: u32,
    /// Backoff delay of the scheduled reconnect, in milliseconds.
    pub retry_delay_ms: Option<u64>,
    /// Last transport error message.
    pub last_error: Option<String>,
    /// When the current connection opened.
    pub connected_at: Option<DateTime<Utc>>,
    /// Last inbound heartbeat.
    pub last_heartbeat: Option<DateTime<Utc>>,
    /// Milliseconds since the last inbound heartbeat.
    pub heartbeat_age_ms: Option<i64>,
    /// Performance counters.
    pub performance: PerformanceSnapshot,
    /// Tracked channels.
    pub subscriptions: Vec<String>,
    /// Entries currently in the event log.
    pub event_log_len: usize,
    /// Retained alerts nobody has acknowledged yet.
    pub unacknowledged_alerts: usize,
    /// Metrics whose value is above their threshold.
    pub metrics_over_threshold: usize,
}

/// Everything the sync driver owns, behind one lock.
#[derive(Debug, Clone)]
pub struct SyncState {
    connection: ConnectionManager,
    subscriptions: SubscriptionRegistry,
    entities: EntitySynchronizer,
    event_log: EventLog<LoggedEvent>,
    performance: PerformanceMonitor,
}

impl SyncState {
    /// Builds empty state from configuration.
    #[must_use]
    pub fn new(config: &SyncConfig) -> Self {
        let policy = ReconnectPolicy {
            auto_reconnect: config.auto_reconnect,
            max_attempts: config.max_reconnect_attempts,
            base_delay: config.reconnect_base_delay,
        };
        Self {
            connection: ConnectionManager::new(policy),
            subscriptions: SubscriptionRegistry::with_defaults(
                config.default_channels.iter().cloned(),
            ),
            entities: EntitySynchronizer::new(config.alert_capacity),
            event_log: EventLog::with_capacity(config.event_log_capacity),
            performance: PerformanceMonitor::new(Utc::now()),
        }
    }

    /// Decodes and applies one inbound text frame.
    ///
    /// Malformed frames never propagate: they are logged, counted as
    /// errors, and reported as [`InboundOutcome::Dropped`].
    pub fn handle_inbound(&mut self, text: &str, now: DateTime<Utc>) -> InboundOutcome {
        let value: serde_json::Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => return self.drop_malformed(e.into()),
        };
        let frame = match ServerFrame::deserialize(&value) {
            Ok(frame) => frame,
            Err(e) => return self.drop_malformed(e.into()),
        };

        let event_type = frame.type_str();
        let outcome = match frame {
            ServerFrame::Heartbeat => {
                self.connection.record_heartbeat(now);
                InboundOutcome::Heartbeat
            }
            ServerFrame::Pong(pong) => {
                self.performance.record_latency(pong.latency);
                InboundOutcome::Latency(pong.latency)
            }
            entity_frame => match entity_frame.into_entity_update() {
                Some(update) => self
                    .entities
                    .apply(update)
                    .map_or(InboundOutcome::Unchanged, InboundOutcome::Applied),
                None => InboundOutcome::Unchanged,
            },
        };

        let payload = value.get("data").cloned().unwrap_or_default();
        self.event_log
            .add_event(LoggedEvent::new(Direction::Inbound, event_type, payload));
        self.performance.record_message();
        outcome
    }

    /// Records a frame that reached the transport.
    pub fn record_outbound(&mut self, message: &OutboundMessage) {
        self.event_log.add_event(LoggedEvent::new(
            Direction::Outbound,
            message.msg_type.clone(),
            message.data.clone(),
        ));
    }

    /// Counts a transport failure and lets the connection manager decide
    /// on a retry.
    pub fn record_transport_error(&mut self, err: &SyncError) -> Option<RetryPlan> {
        self.performance.record_error();
        self.connection.on_error(err)
    }

    /// Counts a frame the transport could not hand over as text.
    pub fn record_malformed(&mut self, err: SyncError) -> InboundOutcome {
        self.drop_malformed(err)
    }

    fn drop_malformed(&mut self, err: SyncError) -> InboundOutcome {
        tracing::warn!(error = %err, "dropping malformed frame");
        self.performance.record_error();
        InboundOutcome::Dropped(err)
    }

    /// Summarizes connection state and counters.
    #[must_use]
    pub fn status(&self, now: DateTime<Utc>) -> SyncStatus {
        SyncStatus {
            status: self.connection.status(),
            endpoint: self.connection.endpoint().map(str::to_string),
            reconnect_attempts: self.connection.reconnect_attempts(),
            retry_delay_ms: self
                .connection
                .pending_retry()
                .map(|plan| u64::try_from(plan.delay.as_millis()).unwrap_or(u64::MAX)),
            last_error: self.connection.last_error().map(str::to_string),
            connected_at: self.connection.connected_at(),
            last_heartbeat: self.connection.last_heartbeat(),
            heartbeat_age_ms: self
                .connection
                .heartbeat_age(now)
                .map(|age| age.num_milliseconds()),
            performance: self.performance.snapshot(),
            subscriptions: self.subscriptions.channels(),
            event_log_len: self.event_log.len(),
            unacknowledged_alerts: self.entities.alerts().unacknowledged(),
            metrics_over_threshold: self
                .entities
                .metrics()
                .iter()
                .filter(|m| m.is_over_threshold())
                .count(),
        }
    }

    /// Connection state machine.
    #[must_use]
    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Subscription registry.
    #[must_use]
    pub fn subscriptions(&self) -> &SubscriptionRegistry {
        &self.subscriptions
    }

    /// Entity collections.
    #[must_use]
    pub fn entities(&self) -> &EntitySynchronizer {
        &self.entities
    }

    /// General event log, newest first.
    #[must_use]
    pub fn event_log(&self) -> &EventLog<LoggedEvent> {
        &self.event_log
    }

    /// Performance counters.
    #[must_use]
    pub fn performance(&self) -> &PerformanceMonitor {
        &self.performance
    }

    pub(crate) fn connection_mut(&mut self) -> &mut ConnectionManager {
        &mut self.connection
    }

    pub(crate) fn subscriptions_mut(&mut self) -> &mut SubscriptionRegistry {
        &mut self.subscriptions
    }

    pub(crate) fn performance_mut(&mut self) -> &mut PerformanceMonitor {
        &mut self.performance
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{AlertSeverity, CallStatus, CampaignState, ChangeKind, CollectionKind};

    fn state() -> SyncState {
        SyncState::new(&SyncConfig::default())
    }

    #[test]
    fn ringing_then_connected_scenario() {
        let mut state = state();
        let now = Utc::now();
        state.handle_inbound(
            r#"{"type":"call_update","data":{"id":"c1","status":"ringing"}}"#,
            now,
        );
        let outcome = state.handle_inbound(
            r#"{"type":"call_update","data":{"id":"c1","status":"connected","duration":45}}"#,
            now,
        );

        let InboundOutcome::Applied(change) = outcome else {
            panic!("expected an applied change, got {outcome:?}");
        };
        assert_eq!(change.kind, ChangeKind::Replaced);
        let calls = state.entities().calls();
        assert_eq!(calls.len(), 1);
        let Some(c1) = calls.get("c1") else {
            panic!("c1 missing");
        };
        assert_eq!(c1.status, CallStatus::Connected);
        assert_eq!(c1.duration, 45);
    }

    #[test]
    fn each_frame_is_logged_and_counted() {
        let mut state = state();
        let now = Utc::now();
        state.handle_inbound(r#"{"type":"heartbeat"}"#, now);
        state.handle_inbound(
            r#"{"type":"agent_update","data":{"id":"a1","status":"available"}}"#,
            now,
        );

        assert_eq!(state.performance().message_rate(), 2);
        assert_eq!(state.event_log().len(), 2);
        let newest: Vec<String> = state
            .event_log()
            .iter()
            .map(|e| e.event_type.clone())
            .collect();
        assert_eq!(newest, vec!["agent_update", "heartbeat"]);
        assert_eq!(state.connection().last_heartbeat(), Some(now));
    }

    #[test]
    fn malformed_frames_are_dropped_and_counted() {
        let mut state = state();
        let now = Utc::now();
        for text in ["{", r#"{"type":"nope"}"#, r#"{"type":"call_update","data":42}"#] {
            let outcome = state.handle_inbound(text, now);
            assert!(matches!(outcome, InboundOutcome::Dropped(SyncError::Parse(_))));
        }
        assert_eq!(state.performance().error_rate(), 3);
        assert_eq!(state.performance().message_rate(), 0);
        assert!(state.event_log().is_empty());
        assert!(state.entities().calls().is_empty());
    }

    #[test]
    fn pong_records_latency() {
        let mut state = state();
        let outcome =
            state.handle_inbound(r#"{"type":"pong","data":{"latency":12.5}}"#, Utc::now());
        assert_eq!(outcome, InboundOutcome::Latency(12.5));
        assert_eq!(state.performance().latency_ms(), Some(12.5));
    }

    #[test]
    fn removal_of_absent_id_is_unchanged() {
        let mut state = state();
        let outcome = state.handle_inbound(
            r#"{"type":"entity_removed","data":{"collection":"metrics","id":"m404"}}"#,
            Utc::now(),
        );
        assert_eq!(outcome, InboundOutcome::Unchanged);
    }

    #[test]
    fn alert_without_severity_applies() {
        let mut state = state();
        let outcome = state.handle_inbound(
            r#"{"type":"system_alert","data":{"id":"al1","title":"x"}}"#,
            Utc::now(),
        );
        let InboundOutcome::Applied(change) = outcome else {
            panic!("alert should apply, got {outcome:?}");
        };
        assert_eq!(change.collection, CollectionKind::Alerts);
        let alerts = state.entities().alerts().snapshot();
        let Some(alert) = alerts.first() else {
            panic!("alert missing");
        };
        assert_eq!(alert.severity, AlertSeverity::Info);
        assert_eq!(state.status(Utc::now()).unacknowledged_alerts, 1);
    }

    #[test]
    fn campaign_update_replaces_progress() {
        let mut state = state();
        let now = Utc::now();
        state.handle_inbound(
            r#"{"type":"campaign_update","data":{"id":"spring","name":"Spring","progress":{"totalContacts":200,"dialed":40}}}"#,
            now,
        );
        let outcome = state.handle_inbound(
            r#"{"type":"campaign_update","data":{"id":"spring","state":"paused","progress":{"totalContacts":200,"dialed":90,"connected":30}}}"#,
            now,
        );
        let InboundOutcome::Applied(change) = outcome else {
            panic!("campaign should apply, got {outcome:?}");
        };
        assert_eq!(change.collection, CollectionKind::Campaigns);
        assert_eq!(change.kind, ChangeKind::Replaced);

        let Some(campaign) = state.entities().campaigns().get("spring") else {
            panic!("campaign missing");
        };
        assert_eq!(campaign.state, CampaignState::Paused);
        assert_eq!(campaign.progress.dialed, 90);
        assert_eq!(campaign.progress.connected, 30);
        // Full replacement: the later frame carried no name.
        assert!(campaign.name.is_empty());
        assert_eq!(state.event_log().len(), 2);
    }

    #[test]
    fn alert_frames_are_capped_and_resent_ids_move_to_front() {
        let config = SyncConfig {
            alert_capacity: 3,
            ..SyncConfig::default()
        };
        let mut state = SyncState::new(&config);
        let now = Utc::now();
        for n in 0..4 {
            let text = format!(
                r#"{{"type":"system_alert","data":{{"id":"al{n}","severity":"warning"}}}}"#
            );
            state.handle_inbound(&text, now);
        }
        let resent = state.handle_inbound(
            r#"{"type":"system_alert","data":{"id":"al2","severity":"critical","acknowledged":true}}"#,
            now,
        );
        let InboundOutcome::Applied(change) = resent else {
            panic!("resent alert should apply, got {resent:?}");
        };
        assert_eq!(change.kind, ChangeKind::Replaced);

        let alerts = state.entities().alerts().snapshot();
        let ids: Vec<&str> = alerts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["al2", "al3", "al1"]);
        let Some(front) = alerts.first() else {
            panic!("feed empty");
        };
        assert_eq!(front.severity, AlertSeverity::Critical);
        assert_eq!(state.status(now).unacknowledged_alerts, 2);
    }

    #[test]
    fn status_counts_metrics_over_threshold() {
        let mut state = state();
        let now = Utc::now();
        for text in [
            r#"{"type":"metric_update","data":{"id":"abandon","value":7.5,"threshold":5.0}}"#,
            r#"{"type":"metric_update","data":{"id":"aht","value":200.0,"threshold":300.0}}"#,
            r#"{"type":"metric_update","data":{"id":"calls","value":42.0}}"#,
        ] {
            state.handle_inbound(text, now);
        }
        assert_eq!(state.status(now).metrics_over_threshold, 1);
    }

    #[test]
    fn event_log_respects_capacity() {
        let config = SyncConfig {
            event_log_capacity: 3,
            ..SyncConfig::default()
        };
        let mut state = SyncState::new(&config);
        let now = Utc::now();
        for n in 0..10 {
            let text = format!(
                r#"{{"type":"metric_update","data":{{"id":"m{n}","value":{n}}}}}"#
            );
            state.handle_inbound(&text, now);
        }
        assert_eq!(state.event_log().len(), 3);
        let ids: Vec<String> = state
            .event_log()
            .iter_arrival()
            .filter_map(|e| e.payload.get("id").and_then(|v| v.as_str()).map(str::to_string))
            .collect();
        assert_eq!(ids, vec!["m7", "m8", "m9"]);
        assert_eq!(state.entities().count(CollectionKind::Metrics), 10);
    }

    #[test]
    fn outbound_is_logged() {
        let mut state = state();
        state.record_outbound(&OutboundMessage::subscribe("calls"));
        let Some(entry) = state.event_log().iter().next() else {
            panic!("expected a log entry");
        };
        assert_eq!(entry.direction, Direction::Outbound);
        assert_eq!(entry.event_type, "subscribe");
    }

    #[test]
    fn transport_errors_count_and_schedule_retry() {
        let mut state = state();
        state.connection_mut().connect("ws://push.local/ws");
        let plan = state.record_transport_error(&SyncError::Transport("refused".to_string()));
        assert!(plan.is_some());
        assert_eq!(state.performance().error_rate(), 1);

        let status = state.status(Utc::now());
        assert_eq!(status.status, ConnectionStatus::Error);
        assert_eq!(status.reconnect_attempts, 1);
        assert!(status.retry_delay_ms.is_some());
        assert_eq!(status.subscriptions.len(), 6);
    }
}
