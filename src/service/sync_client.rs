//! Sync client handle and the driver task that owns the transport.
//!
//! [`SyncClient::new`] returns a cheap, cloneable handle plus a
//! [`SyncDriver`]. The caller spawns [`SyncDriver::run`]; nothing connects
//! or schedules work until the handle asks for it. The driver is the only
//! writer of [`SyncState`]: all mutation happens inside its event loop in
//! transport delivery order, and handles read copies under a short read
//! lock.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{RwLock, broadcast, mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};

use super::sync_state::{InboundOutcome, SyncState, SyncStatus};
use crate::config::{SyncConfig, validate_endpoint};
use crate::domain::{
    CampaignStatus, CollectionKind, EventBus, LiveAgent, LiveCall, LiveMetric, LoggedEvent,
    PerformanceSnapshot, QueueStatus, StoreChange, SystemAlert,
};
use crate::error::SyncError;
use crate::ws::{ConnectionStatus, OutboundMessage, RetryPlan, Transport, TransportConnection};

/// Requests from handles to the driver.
#[derive(Debug)]
enum Command {
    Connect { endpoint: Option<String> },
    Disconnect,
    Subscribe(String),
    Unsubscribe(String),
    Send(OutboundMessage),
    Shutdown,
}

/// Cloneable handle to a running sync driver.
///
/// Snapshot accessors return owned copies; collections are never exposed
/// mutably.
#[derive(Debug, Clone)]
pub struct SyncClient {
    state: Arc<RwLock<SyncState>>,
    commands: mpsc::Sender<Command>,
    changes: EventBus,
    status: watch::Receiver<ConnectionStatus>,
}

impl SyncClient {
    /// Builds a handle and its driver around an injected transport.
    ///
    /// The driver does nothing until spawned and asked to connect.
    #[must_use]
    pub fn new<T: Transport>(config: &SyncConfig, transport: T) -> (Self, SyncDriver<T>) {
        let state = Arc::new(RwLock::new(SyncState::new(config)));
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer.max(1));
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);
        let changes = EventBus::new(config.change_bus_capacity);

        let client = Self {
            state: Arc::clone(&state),
            commands: command_tx,
            changes: changes.clone(),
            status: status_rx,
        };
        let driver = SyncDriver {
            transport,
            state,
            commands: command_rx,
            changes,
            status: status_tx,
            default_endpoint: config.endpoint.clone(),
            ping_interval: config.ping_interval,
            rate_window: config.rate_window.max(Duration::from_millis(1)),
            connection: None,
            retry_at: None,
            deferred: VecDeque::new(),
        };
        (client, driver)
    }

    /// Connects to `endpoint`, or to the last/configured endpoint when
    /// `None`. A no-op if already connected.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] for a non-WebSocket endpoint and
    /// [`SyncError::ClientClosed`] if the driver has stopped.
    pub async fn connect(&self, endpoint: Option<String>) -> Result<(), SyncError> {
        if let Some(endpoint) = endpoint.as_deref() {
            validate_endpoint(endpoint)?;
        }
        self.command(Command::Connect { endpoint }).await
    }

    /// Closes the connection and stops automatic reconnection.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ClientClosed`] if the driver has stopped.
    pub async fn disconnect(&self) -> Result<(), SyncError> {
        self.command(Command::Disconnect).await
    }

    /// Tracks `channel`; sent to the server now if connected, otherwise on
    /// the next connect.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidRequest`] for a blank channel name and
    /// [`SyncError::ClientClosed`] if the driver has stopped.
    pub async fn subscribe(&self, channel: impl Into<String>) -> Result<(), SyncError> {
        let channel = normalize_channel(channel.into())?;
        self.command(Command::Subscribe(channel)).await
    }

    /// Stops tracking `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidRequest`] for a blank channel name and
    /// [`SyncError::ClientClosed`] if the driver has stopped.
    pub async fn unsubscribe(&self, channel: impl Into<String>) -> Result<(), SyncError> {
        let channel = normalize_channel(channel.into())?;
        self.command(Command::Unsubscribe(channel)).await
    }

    /// Sends a caller-defined message, fire-and-forget.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidRequest`] for a blank type,
    /// [`SyncError::NotConnected`] when the transport is down, and
    /// [`SyncError::ClientClosed`] if the driver has stopped.
    pub async fn send_message(
        &self,
        msg_type: impl Into<String>,
        data: serde_json::Value,
    ) -> Result<(), SyncError> {
        let msg_type = msg_type.into();
        if msg_type.trim().is_empty() {
            return Err(SyncError::InvalidRequest("message type is empty".to_string()));
        }
        if self.status() != ConnectionStatus::Connected {
            return Err(SyncError::NotConnected);
        }
        self.command(Command::Send(OutboundMessage::new(msg_type, data)))
            .await
    }

    /// Stops the driver after closing the transport.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ClientClosed`] if the driver already stopped.
    pub async fn shutdown(&self) -> Result<(), SyncError> {
        self.command(Command::Shutdown).await
    }

    async fn command(&self, command: Command) -> Result<(), SyncError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SyncError::ClientClosed)
    }

    /// Current connection status.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Receiver that observes every status transition.
    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Receiver for change notifications after each applied update.
    #[must_use]
    pub fn changes(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    /// Connection state, counters, and subscriptions.
    pub async fn sync_status(&self) -> SyncStatus {
        self.state.read().await.status(Utc::now())
    }

    /// Performance counters.
    pub async fn performance(&self) -> PerformanceSnapshot {
        self.state.read().await.performance().snapshot()
    }

    /// Tracked channels.
    pub async fn subscriptions(&self) -> Vec<String> {
        self.state.read().await.subscriptions().channels()
    }

    /// Up to `limit` event log entries, newest first.
    pub async fn events(&self, limit: usize) -> Vec<LoggedEvent> {
        self.state.read().await.event_log().recent(limit)
    }

    /// Snapshot of the live calls.
    pub async fn calls(&self) -> Vec<LiveCall> {
        self.state.read().await.entities().calls().snapshot()
    }

    /// Snapshot of the agents.
    pub async fn agents(&self) -> Vec<LiveAgent> {
        self.state.read().await.entities().agents().snapshot()
    }

    /// Snapshot of the alerts, newest first.
    pub async fn alerts(&self) -> Vec<SystemAlert> {
        self.state.read().await.entities().alerts().snapshot()
    }

    /// Snapshot of the metrics.
    pub async fn metrics(&self) -> Vec<LiveMetric> {
        self.state.read().await.entities().metrics().snapshot()
    }

    /// Snapshot of the queues.
    pub async fn queues(&self) -> Vec<QueueStatus> {
        self.state.read().await.entities().queues().snapshot()
    }

    /// Snapshot of the campaigns.
    pub async fn campaigns(&self) -> Vec<CampaignStatus> {
        self.state.read().await.entities().campaigns().snapshot()
    }

    /// One call by id.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotFound`] if no such call is live.
    pub async fn call(&self, id: &str) -> Result<LiveCall, SyncError> {
        self.state
            .read()
            .await
            .entities()
            .calls()
            .get(id)
            .cloned()
            .ok_or_else(|| SyncError::NotFound {
                collection: CollectionKind::Calls,
                id: id.to_string(),
            })
    }

    /// One agent by id.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotFound`] if no such agent is known.
    pub async fn agent(&self, id: &str) -> Result<LiveAgent, SyncError> {
        self.state
            .read()
            .await
            .entities()
            .agents()
            .get(id)
            .cloned()
            .ok_or_else(|| SyncError::NotFound {
                collection: CollectionKind::Agents,
                id: id.to_string(),
            })
    }
}

fn normalize_channel(channel: String) -> Result<String, SyncError> {
    let trimmed = channel.trim();
    if trimmed.is_empty() {
        return Err(SyncError::InvalidRequest("channel name is empty".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Event loop that owns the transport connection.
pub struct SyncDriver<T: Transport> {
    transport: T,
    state: Arc<RwLock<SyncState>>,
    commands: mpsc::Receiver<Command>,
    changes: EventBus,
    status: watch::Sender<ConnectionStatus>,
    default_endpoint: String,
    ping_interval: Duration,
    rate_window: Duration,
    connection: Option<T::Connection>,
    retry_at: Option<Instant>,
    /// Commands that arrived during a handshake, run before new ones.
    deferred: VecDeque<Command>,
}

impl<T: Transport> fmt::Debug for SyncDriver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncDriver")
            .field("default_endpoint", &self.default_endpoint)
            .field("connected", &self.connection.is_some())
            .field("retry_at", &self.retry_at)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> SyncDriver<T> {
    /// Runs until [`SyncClient::shutdown`] is called or every handle is
    /// dropped.
    pub async fn run(mut self) {
        let start = Instant::now();
        let mut rate_tick = tokio::time::interval_at(start + self.rate_window, self.rate_window);
        rate_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let pings_enabled = !self.ping_interval.is_zero();
        let ping_period = if pings_enabled {
            self.ping_interval
        } else {
            Duration::from_secs(3_600)
        };
        let mut ping_tick = tokio::time::interval_at(start + ping_period, ping_period);
        ping_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::debug!("sync driver started");
        loop {
            if let Some(command) = self.deferred.pop_front() {
                if matches!(command, Command::Shutdown) {
                    break;
                }
                self.handle_command(command).await;
                continue;
            }
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(Command::Shutdown) | None => break,
                        Some(command) => self.handle_command(command).await,
                    }
                }
                frame = recv_frame(&mut self.connection) => {
                    self.handle_frame(frame).await;
                }
                () = retry_sleep(self.retry_at) => {
                    self.retry_at = None;
                    self.retry().await;
                }
                _ = rate_tick.tick() => {
                    self.state.write().await.performance_mut().reset_rates(Utc::now());
                }
                _ = ping_tick.tick(), if pings_enabled => {
                    self.send(OutboundMessage::ping(Utc::now())).await;
                }
            }
        }

        self.retry_at = None;
        self.state.write().await.connection_mut().disconnect();
        self.close_connection().await;
        self.publish_status().await;
        tracing::info!("sync driver stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect { endpoint } => {
                let endpoint = {
                    let state = self.state.read().await;
                    endpoint
                        .or_else(|| state.connection().endpoint().map(str::to_string))
                        .unwrap_or_else(|| self.default_endpoint.clone())
                };
                let proceed = self
                    .state
                    .write()
                    .await
                    .connection_mut()
                    .connect(endpoint.clone());
                if proceed {
                    self.retry_at = None;
                    self.open(endpoint).await;
                } else {
                    tracing::debug!(%endpoint, "connect ignored, already connected");
                }
            }
            Command::Disconnect => self.disconnect().await,
            Command::Subscribe(channel) => {
                let added = self
                    .state
                    .write()
                    .await
                    .subscriptions_mut()
                    .subscribe(channel.clone());
                if added {
                    tracing::info!(%channel, "subscribed");
                    self.send(OutboundMessage::subscribe(&channel)).await;
                }
            }
            Command::Unsubscribe(channel) => {
                let removed = self
                    .state
                    .write()
                    .await
                    .subscriptions_mut()
                    .unsubscribe(&channel);
                if removed {
                    tracing::info!(%channel, "unsubscribed");
                    self.send(OutboundMessage::unsubscribe(&channel)).await;
                }
            }
            Command::Send(message) => self.send(message).await,
            Command::Shutdown => {}
        }
    }

    async fn handle_frame(&mut self, frame: Option<Result<String, SyncError>>) {
        match frame {
            Some(Ok(text)) => {
                let outcome = self.state.write().await.handle_inbound(&text, Utc::now());
                if let InboundOutcome::Applied(change) = outcome {
                    self.changes.publish(change);
                }
            }
            Some(Err(err @ SyncError::Parse(_))) => {
                self.state.write().await.record_malformed(err);
            }
            Some(Err(err)) => {
                tracing::warn!(error = %err, "transport failed");
                self.connection = None;
                self.on_transport_failure(&err).await;
            }
            None => {
                tracing::info!("server closed the connection");
                self.connection = None;
                let plan = self.state.write().await.connection_mut().on_close(None);
                self.schedule(plan);
                self.publish_status().await;
            }
        }
    }

    /// Connects to `endpoint` while still listening for commands, so a
    /// disconnect or shutdown abandons a slow handshake immediately.
    async fn open(&mut self, endpoint: String) {
        self.publish_status().await;
        let handshake = {
            let connecting = self.transport.connect(&endpoint);
            tokio::pin!(connecting);
            loop {
                tokio::select! {
                    result = &mut connecting => break Some(result),
                    command = self.commands.recv() => match command {
                        Some(Command::Disconnect) => break None,
                        Some(Command::Shutdown) | None => {
                            self.deferred.push_back(Command::Shutdown);
                            break None;
                        }
                        Some(command) => self.deferred.push_back(command),
                    },
                }
            }
        };
        let Some(handshake) = handshake else {
            tracing::info!(%endpoint, "handshake abandoned");
            self.disconnect().await;
            return;
        };
        match handshake {
            Ok(connection) => {
                self.connection = Some(connection);
                let (notice, channels) = {
                    let mut state = self.state.write().await;
                    let notice = state.connection_mut().on_open(Utc::now());
                    let channels = state.subscriptions_mut().on_reconnected(&notice);
                    (notice, channels)
                };
                tracing::info!(
                    endpoint = %notice.endpoint,
                    previous_attempts = notice.previous_attempts,
                    "connected"
                );
                self.publish_status().await;
                for channel in channels {
                    self.send(OutboundMessage::subscribe(&channel)).await;
                }
            }
            Err(err) => {
                tracing::warn!(%endpoint, error = %err, "connect failed");
                self.on_transport_failure(&err).await;
            }
        }
    }

    async fn retry(&mut self) {
        let endpoint = self.state.write().await.connection_mut().begin_retry();
        if let Some(endpoint) = endpoint {
            tracing::info!(%endpoint, "reconnecting");
            self.open(endpoint).await;
        }
    }

    async fn disconnect(&mut self) {
        self.retry_at = None;
        let was_active = self.state.write().await.connection_mut().disconnect();
        self.close_connection().await;
        self.publish_status().await;
        if was_active {
            tracing::info!("disconnected");
        }
    }

    async fn on_transport_failure(&mut self, err: &SyncError) {
        let plan = self.state.write().await.record_transport_error(err);
        self.schedule(plan);
        self.publish_status().await;
    }

    fn schedule(&mut self, plan: Option<RetryPlan>) {
        self.retry_at = plan.map(|plan| {
            tracing::info!(
                attempt = plan.attempt,
                delay_ms = u64::try_from(plan.delay.as_millis()).unwrap_or(u64::MAX),
                "reconnect scheduled"
            );
            Instant::now() + plan.delay
        });
    }

    /// Best-effort send; dropped with a debug log when not connected.
    async fn send(&mut self, message: OutboundMessage) {
        let Some(connection) = self.connection.as_mut() else {
            tracing::debug!(msg_type = %message.msg_type, "not connected, dropping outbound message");
            return;
        };
        let text = match message.to_json() {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(error = %err, msg_type = %message.msg_type, "cannot encode outbound message");
                return;
            }
        };
        match connection.send(text).await {
            Ok(()) => self.state.write().await.record_outbound(&message),
            Err(err) => {
                tracing::warn!(error = %err, "send failed");
                self.connection = None;
                self.on_transport_failure(&err).await;
            }
        }
    }

    async fn close_connection(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close().await;
        }
    }

    async fn publish_status(&self) {
        let status = self.state.read().await.connection().status();
        self.status.send_replace(status);
    }
}

async fn recv_frame<C: TransportConnection>(
    connection: &mut Option<C>,
) -> Option<Result<String, SyncError>> {
    match connection {
        Some(connection) => connection.recv().await,
        None => std::future::pending().await,
    }
}

async fn retry_sleep(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
