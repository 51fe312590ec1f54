//! # callcenter-sync
//!
//! Real-time synchronization client for call-center live dashboards.
//!
//! The client keeps one persistent WebSocket connection to a push server,
//! tracks channel subscriptions across reconnects, and mirrors six live
//! collections (calls, agents, alerts, metrics, queues, campaigns) from
//! server-pushed frames. It also keeps a bounded log of every frame and
//! rolling throughput/latency counters. A small Axum server exposes the
//! synchronized state for diagnostics.
//!
//! ## Architecture
//!
//! ```text
//! Push server (WebSocket)
//!     │
//!     ├── Transport / WsTransport (ws/)
//!     │
//!     ├── SyncDriver ── SyncState (service/)
//!     │       ├── ConnectionManager, SubscriptionRegistry (ws/)
//!     │       └── EntitySynchronizer, EventLog, PerformanceMonitor (domain/)
//!     │
//!     ├── SyncClient handle ── EventBus change notifications (domain/)
//!     │
//!     └── Diagnostics REST API (api/)
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use callcenter_sync::config::SyncConfig;
//! use callcenter_sync::service::SyncClient;
//! use callcenter_sync::ws::WsTransport;
//!
//! # async fn run() -> Result<(), callcenter_sync::error::SyncError> {
//! let config = SyncConfig::from_env()?;
//! let (client, driver) = SyncClient::new(&config, WsTransport::new(config.connect_timeout));
//! tokio::spawn(driver.run());
//! client.connect(None).await?;
//! let calls = client.calls().await;
//! # let _ = calls;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod ws;
