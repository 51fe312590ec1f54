//! Service layer: the sync driver, its shared state, and the modem probe.
//!
//! [`SyncClient`] is the public handle. [`SyncState`] holds everything
//! the driver mutates and is where inbound frames are dispatched.

pub mod modem_probe;
pub mod sync_client;
pub mod sync_state;

pub use modem_probe::{ModemHealth, ModemProbe};
pub use sync_client::{SyncClient, SyncDriver};
pub use sync_state::{InboundOutcome, SyncState, SyncStatus};
