// =============================================================================
// Setup Scanner - Main Entry Point
// =============================================================================
//
// Thin HTTP backend over a technical-indicator provider. Scans a list of
// symbols for bullish / bearish / neutral setups and proxies single-indicator
// requests. Stateless: every request reads fresh provider data.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod config;
mod error;
mod provider;
mod scanner;
mod types;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::config::ScannerConfig;
use crate::provider::IndicatorClient;

const CONFIG_PATH: &str = "scanner_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Setup Scanner starting up");

    let mut config = if std::path::Path::new(CONFIG_PATH).exists() {
        ScannerConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            ScannerConfig::default()
        })
    } else {
        ScannerConfig::default()
    };
    config.apply_env();

    if !config.has_api_key() {
        warn!(
            env = crate::config::ENV_API_KEY,
            "Provider API key is not set; every provider call will fail until it is configured"
        );
    }
    info!(config = ?config, "Configuration resolved");

    // ── 2. Provider client & shared state ────────────────────────────────
    let client = IndicatorClient::new(&config)?;
    let state = Arc::new(AppState::new(Arc::new(client), config.public_dir.clone()));

    // ── 3. HTTP server ───────────────────────────────────────────────────
    let bind_addr = config.bind_addr()?;
    let app = api::rest::router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;

    info!(addr = %bind_addr, public_dir = %config.public_dir.display(), "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    info!("Setup Scanner shut down complete.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal, running until killed");
        std::future::pending::<()>().await;
    }
    warn!("Shutdown signal received, stopping gracefully");
}
