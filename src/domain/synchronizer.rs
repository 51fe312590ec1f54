//! Entity synchronizer: the single owner of all six collections.
//!
//! Every inbound entity frame becomes an [`EntityUpdate`] which is applied
//! to exactly one collection. Nothing else mutates the collections;
//! readers get copies through the snapshot accessors.

use super::collection::{AlertFeed, Collection};
use super::entities::{
    CampaignStatus, CollectionKind, Entity, LiveAgent, LiveCall, LiveMetric, QueueStatus,
    SystemAlert,
};
use super::store_change::{ChangeKind, StoreChange};

/// A mutation targeting one collection.
#[derive(Debug, Clone)]
pub enum EntityUpdate {
    /// Upsert a call. Terminal statuses remove it instead.
    Call(LiveCall),
    /// Upsert an agent.
    Agent(LiveAgent),
    /// Prepend an alert.
    Alert(SystemAlert),
    /// Upsert a metric.
    Metric(LiveMetric),
    /// Upsert a queue.
    Queue(QueueStatus),
    /// Upsert a campaign.
    Campaign(CampaignStatus),
    /// Remove a record by id.
    Remove {
        /// Target collection.
        collection: CollectionKind,
        /// Record id.
        id: String,
    },
}

/// Owner of the live calls, agents, alerts, metrics, queues, and campaigns.
#[derive(Debug, Clone)]
pub struct EntitySynchronizer {
    calls: Collection<LiveCall>,
    agents: Collection<LiveAgent>,
    alerts: AlertFeed,
    metrics: Collection<LiveMetric>,
    queues: Collection<QueueStatus>,
    campaigns: Collection<CampaignStatus>,
}

impl EntitySynchronizer {
    /// Creates empty collections; alerts are capped at `alert_capacity`.
    #[must_use]
    pub fn new(alert_capacity: usize) -> Self {
        Self {
            calls: Collection::new(),
            agents: Collection::new(),
            alerts: AlertFeed::with_capacity(alert_capacity),
            metrics: Collection::new(),
            queues: Collection::new(),
            campaigns: Collection::new(),
        }
    }

    /// Applies one update.
    ///
    /// Returns the resulting change, or `None` when the update was a
    /// removal of an id that was not present.
    pub fn apply(&mut self, update: EntityUpdate) -> Option<StoreChange> {
        match update {
            EntityUpdate::Call(call) => {
                if call.status.is_terminal() {
                    tracing::debug!(call_id = %call.id, status = ?call.status, "call ended");
                    return self.remove(CollectionKind::Calls, &call.id);
                }
                Some(upsert_into(&mut self.calls, call))
            }
            EntityUpdate::Agent(agent) => Some(upsert_into(&mut self.agents, agent)),
            EntityUpdate::Alert(alert) => {
                let id = alert.id.clone();
                let outcome = self.alerts.upsert(alert);
                Some(StoreChange::new(SystemAlert::KIND, id, outcome.into()))
            }
            EntityUpdate::Metric(metric) => Some(upsert_into(&mut self.metrics, metric)),
            EntityUpdate::Queue(queue) => Some(upsert_into(&mut self.queues, queue)),
            EntityUpdate::Campaign(campaign) => Some(upsert_into(&mut self.campaigns, campaign)),
            EntityUpdate::Remove { collection, id } => self.remove(collection, &id),
        }
    }

    /// Removes `id` from `collection`. Absent ids are a no-op.
    pub fn remove(&mut self, collection: CollectionKind, id: &str) -> Option<StoreChange> {
        let removed = match collection {
            CollectionKind::Calls => self.calls.remove(id).is_some(),
            CollectionKind::Agents => self.agents.remove(id).is_some(),
            CollectionKind::Alerts => self.alerts.remove(id).is_some(),
            CollectionKind::Metrics => self.metrics.remove(id).is_some(),
            CollectionKind::Queues => self.queues.remove(id).is_some(),
            CollectionKind::Campaigns => self.campaigns.remove(id).is_some(),
        };
        removed.then(|| StoreChange::new(collection, id, ChangeKind::Removed))
    }

    /// Live calls.
    #[must_use]
    pub fn calls(&self) -> &Collection<LiveCall> {
        &self.calls
    }

    /// Agents.
    #[must_use]
    pub fn agents(&self) -> &Collection<LiveAgent> {
        &self.agents
    }

    /// Alerts, newest first.
    #[must_use]
    pub fn alerts(&self) -> &AlertFeed {
        &self.alerts
    }

    /// Metrics.
    #[must_use]
    pub fn metrics(&self) -> &Collection<LiveMetric> {
        &self.metrics
    }

    /// Queues.
    #[must_use]
    pub fn queues(&self) -> &Collection<QueueStatus> {
        &self.queues
    }

    /// Campaigns.
    #[must_use]
    pub fn campaigns(&self) -> &Collection<CampaignStatus> {
        &self.campaigns
    }

    /// Number of records in `collection`.
    #[must_use]
    pub fn count(&self, collection: CollectionKind) -> usize {
        match collection {
            CollectionKind::Calls => self.calls.len(),
            CollectionKind::Agents => self.agents.len(),
            CollectionKind::Alerts => self.alerts.len(),
            CollectionKind::Metrics => self.metrics.len(),
            CollectionKind::Queues => self.queues.len(),
            CollectionKind::Campaigns => self.campaigns.len(),
        }
    }
}

fn upsert_into<T: Entity>(collection: &mut Collection<T>, entity: T) -> StoreChange {
    let id = entity.id().to_string();
    let outcome = collection.upsert(entity);
    StoreChange::new(T::KIND, id, outcome.into())
}
