//! Connection state machine.
//!
//! [`ConnectionManager`] holds the connection status, the reconnect
//! attempt counter, heartbeat bookkeeping, and the last error. It performs
//! no I/O: the sync driver feeds it transport events and acts on the
//! decisions it returns, which keeps the state machine testable in
//! isolation from transport and subscription replay.
//!
//! ```text
//!  Disconnected ──connect()──▶ Connecting ──open──▶ Connected
//!       ▲  ▲                      │                    │
//!       │  └──────close───────────┼────────────────────┤
//!       │                         ▼                    ▼
//!       └──────disconnect()──── Error ◀──────error─────┘
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::SyncError;

/// Observable connection status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// No transport; initial state.
    #[default]
    Disconnected,
    /// Transport open in progress.
    Connecting,
    /// Transport open; frames flowing.
    Connected,
    /// Last transport operation failed.
    Error,
}

impl ConnectionStatus {
    /// Returns the status as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
        }
    }
}

/// Reconnect behavior after unexpected transport loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Whether to retry at all.
    pub auto_reconnect: bool,
    /// Retries before giving up.
    pub max_attempts: u32,
    /// Linear backoff step.
    pub base_delay: Duration,
}

impl ReconnectPolicy {
    /// Delay before retry number `attempt` (1-based): `attempt * base_delay`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// Notification that the transport came up.
///
/// Handed to the subscription registry so it can replay its channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconnected {
    /// Endpoint now connected.
    pub endpoint: String,
    /// Automatic attempts made before this success.
    pub previous_attempts: u32,
    /// When the transport opened.
    pub at: DateTime<Utc>,
}

/// A reconnect the driver should perform after `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPlan {
    /// 1-based attempt number.
    pub attempt: u32,
    /// Wait before the attempt.
    pub delay: Duration,
}

/// Transport lifecycle state machine.
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    status: ConnectionStatus,
    policy: ReconnectPolicy,
    endpoint: Option<String>,
    attempts: u32,
    manually_disconnected: bool,
    pending_retry: Option<RetryPlan>,
    last_heartbeat: Option<DateTime<Utc>>,
    connected_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl ConnectionManager {
    /// Creates a manager in `Disconnected` with the given policy.
    #[must_use]
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            policy,
            endpoint: None,
            attempts: 0,
            manually_disconnected: false,
            pending_retry: None,
            last_heartbeat: None,
            connected_at: None,
            last_error: None,
        }
    }

    /// Starts a caller-requested connect.
    ///
    /// Returns `false` without changing anything when already connected or
    /// connecting. Otherwise moves to `Connecting`, resets the attempt
    /// counter, clears the manual-disconnect flag, and drops any pending
    /// retry; the driver should then open the transport.
    pub fn connect(&mut self, endpoint: impl Into<String>) -> bool {
        if matches!(
            self.status,
            ConnectionStatus::Connected | ConnectionStatus::Connecting
        ) {
            return false;
        }
        self.endpoint = Some(endpoint.into());
        self.attempts = 0;
        self.manually_disconnected = false;
        self.pending_retry = None;
        self.status = ConnectionStatus::Connecting;
        true
    }

    /// Starts the scheduled retry, returning the endpoint to open.
    ///
    /// Returns `None` if no retry is pending (for example after a
    /// `disconnect()` raced the timer).
    pub fn begin_retry(&mut self) -> Option<String> {
        if self.manually_disconnected {
            self.pending_retry = None;
            return None;
        }
        self.pending_retry.take()?;
        self.status = ConnectionStatus::Connecting;
        self.endpoint.clone()
    }

    /// Records a successful transport open.
    pub fn on_open(&mut self, now: DateTime<Utc>) -> Reconnected {
        let previous_attempts = self.attempts;
        self.status = ConnectionStatus::Connected;
        self.attempts = 0;
        self.pending_retry = None;
        self.connected_at = Some(now);
        self.last_error = None;
        Reconnected {
            endpoint: self.endpoint.clone().unwrap_or_default(),
            previous_attempts,
            at: now,
        }
    }

    /// Records a transport close. Returns the retry to schedule, if any.
    pub fn on_close(&mut self, reason: Option<&str>) -> Option<RetryPlan> {
        if self.manually_disconnected {
            return None;
        }
        self.status = ConnectionStatus::Disconnected;
        self.connected_at = None;
        if let Some(reason) = reason {
            self.last_error = Some(format!("connection closed: {reason}"));
        }
        self.schedule_retry()
    }

    /// Records a transport failure (refused, timed out, broken). Returns
    /// the retry to schedule, if any.
    pub fn on_error(&mut self, err: &SyncError) -> Option<RetryPlan> {
        if self.manually_disconnected {
            return None;
        }
        self.status = ConnectionStatus::Error;
        self.connected_at = None;
        self.last_error = Some(err.to_string());
        self.schedule_retry()
    }

    /// Caller-requested disconnect. Cancels any pending retry and stops
    /// automatic reconnection until the next `connect()`.
    ///
    /// Returns `true` if there was a connection or retry to tear down.
    pub fn disconnect(&mut self) -> bool {
        let was_active = self.status != ConnectionStatus::Disconnected
            || self.pending_retry.is_some();
        self.manually_disconnected = true;
        self.pending_retry = None;
        self.status = ConnectionStatus::Disconnected;
        self.connected_at = None;
        was_active
    }

    /// Records an inbound heartbeat.
    pub fn record_heartbeat(&mut self, now: DateTime<Utc>) {
        self.last_heartbeat = Some(now);
    }

    /// Time since the last heartbeat, for external staleness monitoring.
    #[must_use]
    pub fn heartbeat_age(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.last_heartbeat.map(|at| now - at)
    }

    fn schedule_retry(&mut self) -> Option<RetryPlan> {
        if !self.policy.auto_reconnect {
            self.pending_retry = None;
            return None;
        }
        if self.attempts >= self.policy.max_attempts {
            self.pending_retry = None;
            self.last_error = Some(
                SyncError::ExhaustedRetries {
                    attempts: self.attempts,
                }
                .to_string(),
            );
            tracing::warn!(attempts = self.attempts, "giving up on reconnect");
            return None;
        }
        self.attempts = self.attempts.saturating_add(1);
        let plan = RetryPlan {
            attempt: self.attempts,
            delay: self.policy.delay_for(self.attempts),
        };
        self.pending_retry = Some(plan);
        Some(plan)
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Returns `true` when frames can be sent.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    /// Endpoint of the current or last connection.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Automatic reconnect attempts since the last successful open.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.attempts
    }

    /// Retry waiting to fire, if any.
    #[must_use]
    pub fn pending_retry(&self) -> Option<RetryPlan> {
        self.pending_retry
    }

    /// Time of the last inbound heartbeat.
    #[must_use]
    pub fn last_heartbeat(&self) -> Option<DateTime<Utc>> {
        self.last_heartbeat
    }

    /// When the current connection opened.
    #[must_use]
    pub fn connected_at(&self) -> Option<DateTime<Utc>> {
        self.connected_at
    }

    /// Last transport error message, cleared on successful open.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const ENDPOINT: &str = "ws://push.local/ws";

    fn policy(max_attempts: u32) -> ReconnectPolicy {
        ReconnectPolicy {
            auto_reconnect: true,
            max_attempts,
            base_delay: Duration::from_millis(100),
        }
    }

    fn refused() -> SyncError {
        SyncError::Transport("connection refused".to_string())
    }

    #[test]
    fn starts_disconnected() {
        let mgr = ConnectionManager::new(policy(3));
        assert_eq!(mgr.status(), ConnectionStatus::Disconnected);
        assert!(mgr.pending_retry().is_none());
        assert!(mgr.last_error().is_none());
    }

    #[test]
    fn connect_then_open() {
        let mut mgr = ConnectionManager::new(policy(3));
        assert!(mgr.connect(ENDPOINT));
        assert_eq!(mgr.status(), ConnectionStatus::Connecting);

        let notice = mgr.on_open(Utc::now());
        assert_eq!(mgr.status(), ConnectionStatus::Connected);
        assert_eq!(notice.endpoint, ENDPOINT);
        assert_eq!(notice.previous_attempts, 0);
    }

    #[test]
    fn connect_is_noop_when_connected() {
        let mut mgr = ConnectionManager::new(policy(3));
        mgr.connect(ENDPOINT);
        mgr.on_open(Utc::now());
        assert!(!mgr.connect("ws://elsewhere/ws"));
        assert_eq!(mgr.endpoint(), Some(ENDPOINT));
        assert!(mgr.is_connected());
    }

    #[test]
    fn close_schedules_linear_backoff() {
        let mut mgr = ConnectionManager::new(policy(5));
        mgr.connect(ENDPOINT);
        mgr.on_open(Utc::now());

        let Some(first) = mgr.on_close(Some("server restart")) else {
            panic!("expected a retry");
        };
        assert_eq!(mgr.status(), ConnectionStatus::Disconnected);
        assert_eq!(first.attempt, 1);
        assert_eq!(first.delay, Duration::from_millis(100));

        assert_eq!(mgr.begin_retry().as_deref(), Some(ENDPOINT));
        assert_eq!(mgr.status(), ConnectionStatus::Connecting);

        let Some(second) = mgr.on_error(&refused()) else {
            panic!("expected a second retry");
        };
        assert_eq!(mgr.status(), ConnectionStatus::Error);
        assert_eq!(second.attempt, 2);
        assert_eq!(second.delay, Duration::from_millis(200));
    }

    #[test]
    fn gives_up_after_max_attempts_and_manual_connect_resets() {
        let max = 3;
        let mut mgr = ConnectionManager::new(policy(max));
        mgr.connect(ENDPOINT);
        mgr.on_open(Utc::now());

        assert!(mgr.on_close(None).is_some());
        for _ in 1..max {
            assert!(mgr.begin_retry().is_some());
            assert!(mgr.on_error(&refused()).is_some());
        }
        assert!(mgr.begin_retry().is_some());
        assert!(mgr.on_error(&refused()).is_none());

        assert!(matches!(
            mgr.status(),
            ConnectionStatus::Disconnected | ConnectionStatus::Error
        ));
        assert!(mgr.pending_retry().is_none());
        assert!(mgr.begin_retry().is_none());
        assert_eq!(mgr.reconnect_attempts(), max);
        assert!(
            mgr.last_error()
                .is_some_and(|e| e.contains("exhausted"))
        );

        assert!(mgr.connect(ENDPOINT));
        assert_eq!(mgr.reconnect_attempts(), 0);
    }

    #[test]
    fn open_resets_attempts() {
        let mut mgr = ConnectionManager::new(policy(5));
        mgr.connect(ENDPOINT);
        mgr.on_error(&refused());
        mgr.begin_retry();
        mgr.on_error(&refused());
        mgr.begin_retry();

        let notice = mgr.on_open(Utc::now());
        assert_eq!(notice.previous_attempts, 2);
        assert_eq!(mgr.reconnect_attempts(), 0);
        assert!(mgr.last_error().is_none());
    }

    #[test]
    fn disconnect_cancels_pending_retry() {
        let mut mgr = ConnectionManager::new(policy(5));
        mgr.connect(ENDPOINT);
        mgr.on_open(Utc::now());
        assert!(mgr.on_close(None).is_some());

        assert!(mgr.disconnect());
        assert!(mgr.pending_retry().is_none());
        assert!(mgr.begin_retry().is_none());
        assert_eq!(mgr.status(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn events_after_manual_disconnect_do_not_retry() {
        let mut mgr = ConnectionManager::new(policy(5));
        mgr.connect(ENDPOINT);
        mgr.on_open(Utc::now());
        mgr.disconnect();

        assert!(mgr.on_close(Some("late close")).is_none());
        assert!(mgr.on_error(&refused()).is_none());
        assert_eq!(mgr.status(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn auto_reconnect_disabled() {
        let mut mgr = ConnectionManager::new(ReconnectPolicy {
            auto_reconnect: false,
            ..policy(5)
        });
        mgr.connect(ENDPOINT);
        mgr.on_open(Utc::now());
        assert!(mgr.on_close(None).is_none());
        assert_eq!(mgr.reconnect_attempts(), 0);
    }

    #[test]
    fn heartbeat_is_recorded_not_enforced() {
        let mut mgr = ConnectionManager::new(policy(5));
        mgr.connect(ENDPOINT);
        mgr.on_open(Utc::now());
        let beat = Utc::now();
        mgr.record_heartbeat(beat);

        let later = beat + chrono::Duration::minutes(10);
        assert_eq!(mgr.last_heartbeat(), Some(beat));
        assert_eq!(mgr.heartbeat_age(later), Some(chrono::Duration::minutes(10)));
        assert!(mgr.is_connected());
    }

    #[test]
    fn status_strings() {
        assert_eq!(ConnectionStatus::Connected.as_str(), "connected");
        assert_eq!(ConnectionStatus::default(), ConnectionStatus::Disconnected);
    }
}
