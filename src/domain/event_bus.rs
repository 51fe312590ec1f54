//! Broadcast channel for store change notifications.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. The sync driver
//! publishes a [`StoreChange`] after every applied entity update, and
//! readers subscribe to learn when to refresh their snapshots.

use tokio::sync::broadcast;

use super::StoreChange;

/// Broadcast bus for [`StoreChange`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity.
/// When the ring buffer is full, the oldest notifications are dropped for
/// lagging receivers; snapshots remain authoritative.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StoreChange>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes a change to all subscribers.
    ///
    /// Returns the number of receivers that got it. With no receivers the
    /// change is silently dropped.
    pub fn publish(&self, change: StoreChange) -> usize {
        self.sender.send(change).unwrap_or(0)
    }

    /// Creates a new receiver for all future changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.sender.subscribe()
    }
}
