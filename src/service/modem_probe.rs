//! Reachability probe for the dialer modem's control port.
//!
//! The probe opens a TCP connection and drops it immediately. It sends no
//! payload, so any service listening on the port counts as reachable.

use std::net::SocketAddr;
use std::time::Duration;

use serde::Serialize;
use tokio::net::TcpStream;
use tokio::time::Instant;
use utoipa::ToSchema;

/// Result of one probe.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ModemHealth {
    /// Probed address.
    #[schema(value_type = String)]
    pub addr: SocketAddr,
    /// Whether a TCP connection was accepted within the timeout.
    pub reachable: bool,
    /// Time to connect, in milliseconds, when reachable.
    pub latency_ms: Option<f64>,
    /// Failure reason when unreachable.
    pub error: Option<String>,
}

/// TCP connect probe with a fixed timeout.
#[derive(Debug, Clone, Copy)]
pub struct ModemProbe {
    addr: SocketAddr,
    timeout: Duration,
}

impl ModemProbe {
    /// Creates a probe for `addr`.
    #[must_use]
    pub fn new(addr: SocketAddr, timeout: Duration) -> Self {
        Self { addr, timeout }
    }

    /// Probed address.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Attempts one connection. Never fails; unreachability is reported
    /// in the result.
    pub async fn check(&self) -> ModemHealth {
        let started = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, TcpStream::connect(self.addr)).await;
        let error = match outcome {
            Ok(Ok(_stream)) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(_) => Some(format!("no answer within {:?}", self.timeout)),
        };
        if let Some(reason) = &error {
            tracing::debug!(addr = %self.addr, error = %reason, "modem probe failed");
        }
        ModemHealth {
            addr: self.addr,
            reachable: error.is_none(),
            latency_ms: error
                .is_none()
                .then(|| started.elapsed().as_secs_f64() * 1_000.0),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listening_port_is_reachable() {
        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            return;
        };
        let Ok(addr) = listener.local_addr() else {
            return;
        };
        let probe = ModemProbe::new(addr, Duration::from_secs(1));

        let health = probe.check().await;
        assert!(health.reachable);
        assert!(health.latency_ms.is_some());
        assert!(health.error.is_none());
        assert_eq!(health.addr, addr);
    }

    #[tokio::test]
    async fn closed_port_is_unreachable() {
        // Bind then drop to get a port nothing listens on.
        let addr = {
            let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
                return;
            };
            let Ok(addr) = listener.local_addr() else {
                return;
            };
            addr
        };
        let health = ModemProbe::new(addr, Duration::from_secs(1)).check().await;
        assert!(!health.reachable);
        assert!(health.latency_ms.is_none());
        assert!(health.error.is_some());
    }
}
