//! Ledger node binary
//!
//! Usage: `asset-ledger-node [config.toml]`. Without a path the configuration
//! is read from `LEDGER_*` environment variables.
//!
//! The node only hosts the ledger actor. It registers no contracts and exposes
//! no network surface; embedders drive the ledger through a `LedgerHandle`.

use anyhow::Context;
use asset_ledger::{spawn_ledger_actor, Config, InMemoryContext, Ledger, Metrics};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => Config::from_env().context("Failed to load config from environment")?,
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .init();

    tracing::info!(
        symbol = %config.token.symbol,
        owner = %config.token.owner,
        "Starting asset ledger node"
    );

    let mut ledger = Ledger::from_config(&config.token);
    let metrics = if config.metrics.enabled {
        let metrics = Metrics::new().context("Failed to register metrics")?;
        ledger = ledger.with_metrics(metrics.clone());
        Some(metrics)
    } else {
        None
    };

    let context = Arc::new(InMemoryContext::new());
    let handle = spawn_ledger_actor(ledger, context, config.actor.mailbox_capacity);
    tracing::info!("Ledger actor running");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    tracing::info!("Shutting down ledger node");
    let ledger = handle.shutdown().await.context("Ledger actor did not stop cleanly")?;
    tracing::info!(
        total_supply = ledger.total_supply(),
        holders = ledger.holders().count(),
        supply_conserved = ledger.check_supply_invariant(),
        "Final ledger state"
    );

    if let Some(metrics) = metrics {
        tracing::debug!(metrics = %metrics.encode()?, "Final metrics");
    }

    Ok(())
}
