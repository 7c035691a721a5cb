//! # Tangle-Chain Node
//!
//! Entry point: logging, configuration, runtime start, and shutdown on
//! Ctrl-C.
//!
//! Logging defaults to `info` and follows `RUST_LOG` when set. Node settings
//! come from defaults overridden by `TC_*` environment variables (see
//! [`node_runtime::container::config`]).

use anyhow::{Context, Result};
use node_runtime::{NodeConfig, NodeRuntime};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;

    let config = NodeConfig::from_env();
    let runtime = NodeRuntime::new(config).context("Failed to build node")?;
    runtime.start().await.context("Failed to start node")?;

    // No peer layer in this binary; outbound gossip is only logged.
    if let Some(mut outbound) = runtime.take_outbound() {
        tokio::spawn(async move {
            while let Some(raw) = outbound.recv().await {
                debug!(id = %raw.id, topic = %raw.topic, "Outbound gossip");
            }
        });
    }

    info!("Node running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    runtime.shutdown().await;
    Ok(())
}
