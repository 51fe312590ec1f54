//! Keyed entity collections.
//!
//! [`Collection`] is an id-keyed map with insert-or-replace semantics.
//! [`AlertFeed`] keeps system alerts newest first under a retention cap
//! while still holding at most one alert per id.

use std::collections::HashMap;

use super::entities::{Entity, SystemAlert};
use super::event_log::EventLog;

/// Result of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No record existed under the id.
    Inserted,
    /// A record existed and was fully replaced.
    Replaced,
}

/// Id-keyed set of entities of one kind.
///
/// At most one record is kept per id. Iteration order is unspecified;
/// readers re-sort as they need.
#[derive(Debug, Clone)]
pub struct Collection<T: Entity> {
    records: HashMap<String, T>,
}

impl<T: Entity> Collection<T> {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    /// Stores `entity`, replacing any record with the same id in full.
    pub fn upsert(&mut self, entity: T) -> UpsertOutcome {
        match self.records.insert(entity.id().to_string(), entity) {
            Some(_) => UpsertOutcome::Replaced,
            None => UpsertOutcome::Inserted,
        }
    }

    /// Removes the record under `id`. Absent ids are a no-op.
    pub fn remove(&mut self, id: &str) -> Option<T> {
        self.records.remove(id)
    }

    /// Returns the record under `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&T> {
        self.records.get(id)
    }

    /// Iterates the records in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.records.values()
    }

    /// Copies every record.
    #[must_use]
    pub fn snapshot(&self) -> Vec<T> {
        self.records.values().cloned().collect()
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T: Entity> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Newest-first alert list with a retention cap.
#[derive(Debug, Clone)]
pub struct AlertFeed {
    alerts: EventLog<SystemAlert>,
}

impl AlertFeed {
    /// Creates an empty feed retaining at most `capacity` alerts.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            alerts: EventLog::with_capacity(capacity),
        }
    }

    /// Prepends `alert`. An existing alert with the same id is dropped
    /// first, so a re-sent alert moves to the front.
    pub fn upsert(&mut self, alert: SystemAlert) -> UpsertOutcome {
        let outcome = if self.remove(&alert.id).is_some() {
            UpsertOutcome::Replaced
        } else {
            UpsertOutcome::Inserted
        };
        self.alerts.add_event(alert);
        outcome
    }

    /// Removes the alert under `id`.
    pub fn remove(&mut self, id: &str) -> Option<SystemAlert> {
        let existing = self.get(id).cloned()?;
        self.alerts.retain(|a| a.id != id);
        Some(existing)
    }

    /// Returns the alert under `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&SystemAlert> {
        self.alerts.iter().find(|a| a.id == id)
    }

    /// Copies every alert, newest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SystemAlert> {
        self.alerts.snapshot()
    }

    /// Number of alerts not yet acknowledged.
    #[must_use]
    pub fn unacknowledged(&self) -> usize {
        self.alerts.iter().filter(|a| !a.acknowledged).count()
    }

    /// Returns the number of retained alerts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    /// Returns `true` if no alerts are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::entities::{AlertSeverity, CallStatus, LiveCall};
    use chrono::Utc;

    fn call(id: &str, status: CallStatus, duration: u64) -> LiveCall {
        LiveCall {
            id: id.to_string(),
            status,
            duration,
            phone_number: String::new(),
            customer_name: None,
            agent_id: None,
            queue_id: None,
            campaign_id: None,
            sentiment: None,
            transcription: Vec::new(),
            start_time: None,
        }
    }

    fn alert(id: &str) -> SystemAlert {
        SystemAlert {
            id: id.to_string(),
            severity: AlertSeverity::Warning,
            title: format!("alert {id}"),
            message: String::new(),
            acknowledged: false,
            timestamp: Utc::now(),
            source: None,
        }
    }

    #[test]
    fn upsert_replaces_in_full() {
        let mut calls = Collection::new();
        let mut first = call("c1", CallStatus::Ringing, 0);
        first.agent_id = Some("a1".to_string());
        assert_eq!(calls.upsert(first), UpsertOutcome::Inserted);
        assert_eq!(
            calls.upsert(call("c1", CallStatus::Connected, 45)),
            UpsertOutcome::Replaced
        );

        assert_eq!(calls.len(), 1);
        let Some(stored) = calls.get("c1") else {
            panic!("c1 should be present");
        };
        assert_eq!(*stored, call("c1", CallStatus::Connected, 45));
        // Fields absent from the later record are not merged back in.
        assert!(stored.agent_id.is_none());
    }

    #[test]
    fn remove_touches_only_target() {
        let mut calls = Collection::new();
        calls.upsert(call("c1", CallStatus::Ringing, 0));
        calls.upsert(call("c2", CallStatus::Connected, 10));
        calls.upsert(call("c3", CallStatus::OnHold, 20));

        assert!(calls.remove("c2").is_some());
        assert!(calls.get("c2").is_none());
        assert_eq!(calls.get("c1"), Some(&call("c1", CallStatus::Ringing, 0)));
        assert_eq!(calls.get("c3"), Some(&call("c3", CallStatus::OnHold, 20)));
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut calls: Collection<LiveCall> = Collection::new();
        calls.upsert(call("c1", CallStatus::Ringing, 0));
        assert!(calls.remove("missing").is_none());
        assert_eq!(calls.len(), 1);
    }

    #[test]
    fn alert_feed_is_newest_first_and_capped() {
        let mut feed = AlertFeed::with_capacity(3);
        for n in 0..5 {
            feed.upsert(alert(&format!("al{n}")));
        }
        let ids: Vec<String> = feed.snapshot().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["al4", "al3", "al2"]);
    }

    #[test]
    fn alert_feed_dedupes_by_id() {
        let mut feed = AlertFeed::with_capacity(10);
        feed.upsert(alert("al1"));
        feed.upsert(alert("al2"));
        let mut acked = alert("al1");
        acked.acknowledged = true;
        assert_eq!(feed.upsert(acked), UpsertOutcome::Replaced);

        assert_eq!(feed.len(), 2);
        assert_eq!(feed.unacknowledged(), 1);
        let snapshot = feed.snapshot();
        let Some(front) = snapshot.first() else {
            panic!("feed should not be empty");
        };
        assert_eq!(front.id, "al1");
        assert!(front.acknowledged);
    }

    #[test]
    fn alert_feed_remove() {
        let mut feed = AlertFeed::with_capacity(10);
        feed.upsert(alert("al1"));
        assert!(feed.remove("al1").is_some());
        assert!(feed.remove("al1").is_none());
        assert!(feed.is_empty());
    }
}
