//! Rolling connection performance counters.
//!
//! [`PerformanceMonitor`] records the latest round-trip latency sample and
//! counts inbound messages and errors within the current window. The
//! window counters are zeroed by [`PerformanceMonitor::reset_rates`], which
//! the sync driver calls on a fixed wall-clock interval regardless of
//! traffic.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PerformanceSnapshot {
    /// Most recent round-trip latency in milliseconds.
    pub latency_ms: Option<f64>,
    /// Valid inbound messages in the current window.
    pub message_rate: u64,
    /// Transport and parse errors in the current window.
    pub error_rate: u64,
    /// Start of the current window.
    pub window_started_at: DateTime<Utc>,
    /// Valid inbound messages since the monitor was created.
    pub total_messages: u64,
    /// Errors since the monitor was created.
    pub total_errors: u64,
}

/// Latency, message-rate, and error-rate bookkeeping.
#[derive(Debug, Clone)]
pub struct PerformanceMonitor {
    latency_ms: Option<f64>,
    message_count: u64,
    error_count: u64,
    window_started_at: DateTime<Utc>,
    total_messages: u64,
    total_errors: u64,
}

impl PerformanceMonitor {
    /// Creates a monitor whose first window starts at `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            latency_ms: None,
            message_count: 0,
            error_count: 0,
            window_started_at: now,
            total_messages: 0,
            total_errors: 0,
        }
    }

    /// Counts one valid inbound message.
    pub fn record_message(&mut self) {
        self.message_count = self.message_count.saturating_add(1);
        self.total_messages = self.total_messages.saturating_add(1);
    }

    /// Counts one transport or parse error.
    pub fn record_error(&mut self) {
        self.error_count = self.error_count.saturating_add(1);
        self.total_errors = self.total_errors.saturating_add(1);
    }

    /// Stores a round-trip latency sample. Negative or non-finite samples
    /// are ignored.
    pub fn record_latency(&mut self, latency_ms: f64) {
        if latency_ms.is_finite() && latency_ms >= 0.0 {
            self.latency_ms = Some(latency_ms);
        }
    }

    /// Zeroes both window counters and starts a new window at `now`.
    pub fn reset_rates(&mut self, now: DateTime<Utc>) {
        self.message_count = 0;
        self.error_count = 0;
        self.window_started_at = now;
    }

    /// Most recent latency sample.
    #[must_use]
    pub fn latency_ms(&self) -> Option<f64> {
        self.latency_ms
    }

    /// Messages in the current window.
    #[must_use]
    pub fn message_rate(&self) -> u64 {
        self.message_count
    }

    /// Errors in the current window.
    #[must_use]
    pub fn error_rate(&self) -> u64 {
        self.error_count
    }

    /// Copies the counters.
    #[must_use]
    pub fn snapshot(&self) -> PerformanceSnapshot {
        PerformanceSnapshot {
            latency_ms: self.latency_ms,
            message_rate: self.message_count,
            error_rate: self.error_count,
            window_started_at: self.window_started_at,
            total_messages: self.total_messages,
            total_errors: self.total_errors,
        }
    }
}
