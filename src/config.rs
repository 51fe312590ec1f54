//! Sync client configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Every key has a default so the daemon
//! starts against a local push server with no configuration at all.

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::SyncError;

/// Channels subscribed after every connect unless overridden.
pub const DEFAULT_CHANNELS: [&str; 6] = [
    "calls",
    "agents",
    "alerts",
    "metrics",
    "queues",
    "campaigns",
];

/// Top-level sync client configuration.
///
/// Loaded once at startup via [`SyncConfig::from_env`].
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Push server endpoint (e.g. `ws://127.0.0.1:8080/ws`).
    pub endpoint: String,

    /// Whether transport loss schedules automatic reconnects.
    pub auto_reconnect: bool,

    /// Automatic reconnect attempts before giving up.
    pub max_reconnect_attempts: u32,

    /// Base reconnect delay; attempt `n` waits `n * base`.
    pub reconnect_base_delay: Duration,

    /// Upper bound on a single transport connect.
    pub connect_timeout: Duration,

    /// Interval between keepalive pings. Zero disables pings.
    pub ping_interval: Duration,

    /// Length of the message/error rate window.
    pub rate_window: Duration,

    /// Capacity of the general event log.
    pub event_log_capacity: usize,

    /// Maximum retained system alerts.
    pub alert_capacity: usize,

    /// Channels subscribed after every successful connect.
    pub default_channels: Vec<String>,

    /// Capacity of the store change broadcast channel.
    pub change_bus_capacity: usize,

    /// Buffer size of the client command channel.
    pub command_buffer: usize,

    /// Socket address for the diagnostics HTTP server.
    pub diagnostics_addr: SocketAddr,

    /// Modem daemon health-check port; `None` disables the probe.
    pub modem_health_addr: Option<SocketAddr>,

    /// Timeout for a single modem health probe.
    pub modem_probe_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:8080/ws".to_string(),
            auto_reconnect: true,
            max_reconnect_attempts: 5,
            reconnect_base_delay: Duration::from_millis(1_000),
            connect_timeout: Duration::from_secs(10),
            ping_interval: Duration::from_secs(30),
            rate_window: Duration::from_secs(60),
            event_log_capacity: 1_000,
            alert_capacity: 100,
            default_channels: DEFAULT_CHANNELS.iter().map(|c| (*c).to_string()).collect(),
            change_bus_capacity: 1_024,
            command_buffer: 256,
            diagnostics_addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            modem_health_addr: None,
            modem_probe_timeout: Duration::from_millis(500),
        }
    }
}

impl SyncConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to the [`Default`] values when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] if `DIAGNOSTICS_ADDR` or
    /// `MODEM_HEALTH_ADDR` is set but cannot be parsed as a
    /// [`SocketAddr`], or if `SYNC_ENDPOINT` is not a `ws://`/`wss://` URL.
    pub fn from_env() -> Result<Self, SyncError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let endpoint = std::env::var("SYNC_ENDPOINT").unwrap_or(defaults.endpoint);
        validate_endpoint(&endpoint)?;

        let diagnostics_addr = match std::env::var("DIAGNOSTICS_ADDR") {
            Ok(raw) => parse_addr("DIAGNOSTICS_ADDR", &raw)?,
            Err(_) => defaults.diagnostics_addr,
        };
        let modem_health_addr = match std::env::var("MODEM_HEALTH_ADDR") {
            Ok(raw) if !raw.trim().is_empty() => Some(parse_addr("MODEM_HEALTH_ADDR", &raw)?),
            _ => None,
        };

        let default_channels = std::env::var("SYNC_DEFAULT_CHANNELS")
            .map(|raw| parse_channel_list(&raw))
            .unwrap_or(defaults.default_channels);

        let rate_window_secs: u64 = parse_env("SYNC_RATE_WINDOW_SECS", 60);

        Ok(Self {
            endpoint,
            auto_reconnect: parse_env_bool("SYNC_AUTO_RECONNECT", defaults.auto_reconnect),
            max_reconnect_attempts: parse_env(
                "SYNC_MAX_RECONNECT_ATTEMPTS",
                defaults.max_reconnect_attempts,
            ),
            reconnect_base_delay: Duration::from_millis(parse_env(
                "SYNC_RECONNECT_BASE_DELAY_MS",
                1_000,
            )),
            connect_timeout: Duration::from_secs(parse_env("SYNC_CONNECT_TIMEOUT_SECS", 10)),
            ping_interval: Duration::from_secs(parse_env("SYNC_PING_INTERVAL_SECS", 30)),
            rate_window: Duration::from_secs(rate_window_secs.max(1)),
            event_log_capacity: parse_env("SYNC_EVENT_LOG_CAPACITY", defaults.event_log_capacity),
            alert_capacity: parse_env("SYNC_ALERT_CAPACITY", defaults.alert_capacity),
            default_channels,
            change_bus_capacity: parse_env(
                "SYNC_CHANGE_BUS_CAPACITY",
                defaults.change_bus_capacity,
            ),
            command_buffer: defaults.command_buffer,
            diagnostics_addr,
            modem_health_addr,
            modem_probe_timeout: Duration::from_millis(parse_env("MODEM_PROBE_TIMEOUT_MS", 500)),
        })
    }
}

/// Checks that `endpoint` uses a WebSocket scheme.
///
/// # Errors
///
/// Returns [`SyncError::Config`] for any other scheme.
pub fn validate_endpoint(endpoint: &str) -> Result<(), SyncError> {
    if endpoint.starts_with("ws://") || endpoint.starts_with("wss://") {
        Ok(())
    } else {
        Err(SyncError::Config(format!(
            "endpoint must start with ws:// or wss://, got {endpoint}"
        )))
    }
}

/// Splits a comma-separated channel list, dropping blanks and duplicates.
fn parse_channel_list(raw: &str) -> Vec<String> {
    let mut channels: Vec<String> = Vec::new();
    for channel in raw.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        if !channels.iter().any(|c| c == channel) {
            channels.push(channel.to_string());
        }
    }
    channels
}

fn parse_addr(key: &str, raw: &str) -> Result<SocketAddr, SyncError> {
    raw.trim()
        .parse()
        .map_err(|e| SyncError::Config(format!("{key}={raw}: {e}")))
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().map(|v| v.to_ascii_lowercase()).as_deref() {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}
