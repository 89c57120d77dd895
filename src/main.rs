// =============================================================================
// Signal Wheel API — Main Entry Point
// =============================================================================
//
// Loads the signal and scenario datasets once, then serves them read-only
// over HTTP. A dataset that is missing or malformed aborts startup.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod dataset;
mod runtime_config;
mod types;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::dataset::Dataset;
use crate::runtime_config::ServiceConfig;

const CONFIG_PATH: &str = "service_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Signal Wheel API starting up");

    let mut config = ServiceConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        ServiceConfig::default()
    });
    config.apply_env();

    info!(
        data_dir = %config.data_dir.display(),
        sample_size = config.signal_sample_size,
        "Configuration resolved"
    );

    // ── 2. Load datasets (fatal on failure) ──────────────────────────────
    let dataset = Dataset::load(config.signals_path(), config.scenarios_path())
        .context("failed to load datasets")?;

    info!(
        signals = dataset.signals().len(),
        scenarios = dataset.scenarios().len(),
        "Datasets ready"
    );
    for combo in dataset.combination_counts() {
        info!(%combo, "scenario combination");
    }

    // ── 3. Build shared state ────────────────────────────────────────────
    let state = Arc::new(AppState::new(dataset, config.signal_sample_size));

    // ── 4. Serve until Ctrl+C ────────────────────────────────────────────
    let app = api::rest::router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind API server to {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    info!("Signal Wheel API shut down complete.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    warn!("Shutdown signal received, stopping gracefully");
}
