//! Bounded, newest-first history of messages.
//!
//! [`EventLog`] keeps at most `capacity` entries. New entries are
//! prepended and the oldest entries fall off the back once the cap is
//! reached. The log is a diagnostic record only; current entity state
//! lives in the synchronizer's collections.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Direction of a logged message relative to this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Received from the server.
    Inbound,
    /// Sent to the server.
    Outbound,
}

/// One entry in the general message log.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoggedEvent {
    /// Local identifier for the entry.
    pub id: uuid::Uuid,
    /// Inbound or outbound.
    pub direction: Direction,
    /// Frame type string (e.g. `"call_update"`).
    pub event_type: String,
    /// Local time the frame was handled.
    pub timestamp: DateTime<Utc>,
    /// Frame payload.
    pub payload: serde_json::Value,
}

impl LoggedEvent {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(
        direction: Direction,
        event_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            direction,
            event_type: event_type.into(),
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Fixed-capacity history, newest entry first.
#[derive(Debug, Clone)]
pub struct EventLog<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> EventLog<T> {
    /// Creates an empty log holding at most `capacity` entries.
    ///
    /// A capacity of zero is bumped to one. Storage grows with the entries
    /// actually added, so a large cap costs nothing up front.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Prepends an entry, evicting the oldest ones beyond capacity.
    pub fn add_event(&mut self, event: T) {
        self.entries.push_front(event);
        self.entries.truncate(self.capacity);
    }

    /// Keeps only the entries for which `keep` returns `true`.
    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.entries.retain(keep);
    }

    /// Iterates entries newest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    /// Iterates entries in arrival order (oldest first).
    pub fn iter_arrival(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().rev()
    }

    /// Copies up to `limit` entries, newest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<T> {
        self.entries.iter().take(limit).cloned().collect()
    }

    /// Copies every entry, newest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of retained entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepends_newest_first() {
        let mut log = EventLog::with_capacity(10);
        log.add_event(1);
        log.add_event(2);
        log.add_event(3);
        assert_eq!(log.snapshot(), vec![3, 2, 1]);
    }

    #[test]
    fn keeps_only_most_recent_when_full() {
        let mut log = EventLog::with_capacity(5);
        for n in 0..12 {
            log.add_event(n);
        }
        assert_eq!(log.len(), 5);
        let arrival: Vec<i32> = log.iter_arrival().copied().collect();
        assert_eq!(arrival, vec![7, 8, 9, 10, 11]);
    }

    #[test]
    fn recent_limits_output() {
        let mut log = EventLog::with_capacity(100);
        for n in 0..10 {
            log.add_event(n);
        }
        assert_eq!(log.recent(3), vec![9, 8, 7]);
        assert_eq!(log.recent(50).len(), 10);
    }

    #[test]
    fn zero_capacity_is_bumped() {
        let mut log = EventLog::with_capacity(0);
        log.add_event("a");
        log.add_event("b");
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.snapshot(), vec!["b"]);
    }

    #[test]
    fn retain_keeps_order() {
        let mut log = EventLog::with_capacity(10);
        for n in 0..6 {
            log.add_event(n);
        }
        log.retain(|n| n % 2 == 0);
        assert_eq!(log.snapshot(), vec![4, 2, 0]);
        log.retain(|_| false);
        assert!(log.is_empty());
    }

    #[test]
    fn huge_capacity_does_not_preallocate() {
        let mut log = EventLog::with_capacity(usize::MAX);
        assert_eq!(log.capacity(), usize::MAX);
        assert!(log.is_empty());
        log.add_event("only");
        assert_eq!(log.snapshot(), vec!["only"]);
    }

    #[test]
    fn logged_event_serializes_direction() {
        let event = LoggedEvent::new(
            Direction::Outbound,
            "subscribe",
            serde_json::json!({"channel": "calls"}),
        );
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains("\"outbound\""));
        assert!(json.contains("subscribe"));
    }
}
