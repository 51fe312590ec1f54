//! callcenter-sync daemon entry point.
//!
//! Starts the sync driver against the configured push endpoint and serves
//! the diagnostics API until Ctrl-C.

use anyhow::Context;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use callcenter_sync::api;
use callcenter_sync::app_state::AppState;
use callcenter_sync::config::SyncConfig;
use callcenter_sync::service::{ModemProbe, SyncClient};
use callcenter_sync::ws::WsTransport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    // Load configuration
    let config = SyncConfig::from_env().context("invalid configuration")?;
    tracing::info!(
        endpoint = %config.endpoint,
        addr = %config.diagnostics_addr,
        "starting callcenter-sync"
    );

    // Start the sync driver
    let transport = WsTransport::new(config.connect_timeout);
    let (client, driver) = SyncClient::new(&config, transport);
    let driver_task = tokio::spawn(driver.run());
    client.connect(None).await?;

    // Build application state
    let app_state = AppState {
        client: client.clone(),
        modem_probe: config
            .modem_health_addr
            .map(|addr| ModemProbe::new(addr, config.modem_probe_timeout)),
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.diagnostics_addr)
        .await
        .with_context(|| format!("cannot bind {}", config.diagnostics_addr))?;
    tracing::info!(addr = %config.diagnostics_addr, "diagnostics server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the driver
    client.shutdown().await?;
    driver_task.await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
