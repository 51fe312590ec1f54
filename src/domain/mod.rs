//! Domain layer: entity records, collections, and diagnostics state.
//!
//! This module contains the entity model for the six live collections,
//! the synchronizer that owns them, the bounded event log, the
//! performance counters, and the change bus readers subscribe to.

pub mod collection;
pub mod entities;
pub mod event_bus;
pub mod event_log;
pub mod performance;
pub mod store_change;
pub mod synchronizer;

pub use collection::{AlertFeed, Collection, UpsertOutcome};
pub use entities::{
    AgentStatus, AlertSeverity, CallStatus, CampaignState, CampaignStatus, CollectionKind, Entity,
    LiveAgent, LiveCall, LiveMetric, QueueStatus, SystemAlert,
};
pub use event_bus::EventBus;
pub use event_log::{Direction, EventLog, LoggedEvent};
pub use performance::{PerformanceMonitor, PerformanceSnapshot};
pub use store_change::{ChangeKind, StoreChange};
pub use synchronizer::{EntitySynchronizer, EntityUpdate};
