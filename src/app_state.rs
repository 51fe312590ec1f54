//! Shared application state injected into all Axum handlers.

use crate::service::{ModemProbe, SyncClient};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Handle to the running sync driver.
    pub client: SyncClient,
    /// Modem health probe, when a modem address is configured.
    pub modem_probe: Option<ModemProbe>,
}
