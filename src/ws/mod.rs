//! WebSocket layer: wire messages, connection state, subscriptions, and
//! the transport seam.
//!
//! The client keeps one persistent push connection per endpoint. This
//! module holds the pieces that know about that connection; the driver
//! that ties them together lives in [`crate::service`].

pub mod connection;
pub mod messages;
pub mod subscription;
pub mod transport;

pub use connection::{
    ConnectionManager, ConnectionStatus, ReconnectPolicy, Reconnected, RetryPlan,
};
pub use messages::{OutboundMessage, ServerFrame};
pub use subscription::SubscriptionRegistry;
pub use transport::{Transport, TransportConnection, WsConnection, WsTransport};
