//! Channel subscription registry.
//!
//! Tracks which channels the client wants pushed updates for. The set
//! survives disconnects so that every successful (re)connect can replay it
//! without caller intervention. The configured default channels are
//! restored on every connect, even if a caller unsubscribed from them.

use std::collections::BTreeSet;

use super::connection::Reconnected;

/// The set of channels this client is subscribed to.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionRegistry {
    /// Tracked channel names. A set, so never holds duplicates.
    channels: BTreeSet<String>,
    /// Channels re-added on every connect.
    defaults: BTreeSet<String>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry seeded with the default channel set.
    #[must_use]
    pub fn with_defaults<I, S>(defaults: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let defaults: BTreeSet<String> = defaults.into_iter().map(Into::into).collect();
        Self {
            channels: defaults.clone(),
            defaults,
        }
    }

    /// Adds `channel`. Returns `true` if it was not already tracked.
    pub fn subscribe(&mut self, channel: impl Into<String>) -> bool {
        self.channels.insert(channel.into())
    }

    /// Removes `channel`. Returns `true` if it was tracked.
    pub fn unsubscribe(&mut self, channel: &str) -> bool {
        self.channels.remove(channel)
    }

    /// Channels to subscribe after the connection came up, each once.
    ///
    /// Default channels dropped since the last connect are tracked again
    /// before the replay set is built.
    pub fn on_reconnected(&mut self, notice: &Reconnected) -> Vec<String> {
        self.channels.extend(self.defaults.iter().cloned());
        tracing::debug!(
            previous_attempts = notice.previous_attempts,
            channels = self.channels.len(),
            "replaying subscriptions"
        );
        self.channels()
    }

    /// Copies the tracked channel names in sorted order.
    #[must_use]
    pub fn channels(&self) -> Vec<String> {
        self.channels.iter().cloned().collect()
    }

    /// Returns the number of tracked channels.
    #[must_use]
    pub fn count(&self) -> usize {
        self.channels.len()
    }
}
