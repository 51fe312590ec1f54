//! Transport seam between the sync driver and the network.
//!
//! The driver is generic over [`Transport`], so production code uses the
//! WebSocket implementation in this module while tests inject an
//! in-memory transport.

use std::future::Future;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::SyncError;

/// Opens connections to a push endpoint.
pub trait Transport: Send + Sync + 'static {
    /// Connection type produced by [`Transport::connect`].
    type Connection: TransportConnection;

    /// Opens a connection to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Transport`] when the endpoint is unreachable,
    /// refuses the handshake, or does not answer in time.
    fn connect(
        &self,
        endpoint: &str,
    ) -> impl Future<Output = Result<Self::Connection, SyncError>> + Send;
}

/// A live, message-framed, bidirectional connection.
pub trait TransportConnection: Send + 'static {
    /// Sends one text frame.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Transport`] if the connection is broken.
    fn send(&mut self, text: String) -> impl Future<Output = Result<(), SyncError>> + Send;

    /// Waits for the next text frame. `None` means the peer closed the
    /// connection cleanly.
    fn recv(&mut self) -> impl Future<Output = Option<Result<String, SyncError>>> + Send;

    /// Closes the connection. Errors during close are ignored.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// WebSocket transport backed by `tokio-tungstenite`.
#[derive(Debug, Clone)]
pub struct WsTransport {
    connect_timeout: Duration,
}

impl WsTransport {
    /// Creates a transport that gives up on a handshake after
    /// `connect_timeout`.
    #[must_use]
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Transport for WsTransport {
    type Connection = WsConnection;

    async fn connect(&self, endpoint: &str) -> Result<WsConnection, SyncError> {
        let handshake = tokio_tungstenite::connect_async(endpoint);
        let (stream, response) = tokio::time::timeout(self.connect_timeout, handshake)
            .await
            .map_err(|_| {
                SyncError::Transport(format!(
                    "connect to {endpoint} timed out after {:?}",
                    self.connect_timeout
                ))
            })??;
        tracing::debug!(endpoint, status = %response.status(), "websocket handshake complete");
        Ok(WsConnection { stream })
    }
}

/// An open WebSocket connection.
#[derive(Debug)]
pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TransportConnection for WsConnection {
    async fn send(&mut self, text: String) -> Result<(), SyncError> {
        self.stream.send(Message::text(text)).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, SyncError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Binary(bytes)) => {
                    return Some(
                        String::from_utf8(bytes.to_vec())
                            .map_err(|e| SyncError::Parse(format!("binary frame: {e}"))),
                    );
                }
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "server closed websocket");
                    return None;
                }
                // Pings are answered by tungstenite on the next read.
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Err(e) => return Some(Err(e.into())),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!(error = %e, "websocket close failed");
        }
    }
}
