//! Change notifications emitted after every applied entity update.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::collection::UpsertOutcome;
use super::entities::CollectionKind;

/// What happened to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// A new record was created.
    Inserted,
    /// An existing record was replaced.
    Replaced,
    /// The record was removed.
    Removed,
}

impl From<UpsertOutcome> for ChangeKind {
    fn from(outcome: UpsertOutcome) -> Self {
        match outcome {
            UpsertOutcome::Inserted => Self::Inserted,
            UpsertOutcome::Replaced => Self::Replaced,
        }
    }
}

/// A single applied mutation of one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreChange {
    /// Collection that changed.
    pub collection: CollectionKind,
    /// Id of the affected record.
    pub id: String,
    /// Kind of change.
    pub kind: ChangeKind,
    /// When the change was applied locally.
    pub timestamp: DateTime<Utc>,
}

impl StoreChange {
    /// Creates a change stamped with the current time.
    #[must_use]
    pub fn new(collection: CollectionKind, id: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            collection,
            id: id.into(),
            kind,
            timestamp: Utc::now(),
        }
    }
}
