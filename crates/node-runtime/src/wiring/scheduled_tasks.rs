//! # Scheduled Tasks
//!
//! Fixed-period loops started by the runtime. A pass that overruns its
//! period skips the missed ticks instead of bursting.

use crate::handlers::{
    punish_equivocations, sweep_finalizations, sweep_forks, GossipAnnouncer, GossipHandler,
};
use shared_bus::{GossipMessage, InMemoryEventBus, RawMessage};
use std::sync::Arc;
use std::time::Duration;
use tc_01_block_graph::BlockGraph;
use tc_03_fork_resolution::ForkResolver;
use tc_04_hybrid_consensus::HybridConsensus;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::debug;

fn ticker(period: Duration) -> Interval {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

/// Resolve expired forks every `period`.
pub fn spawn_fork_sweep(
    forks: Arc<ForkResolver>,
    bus: Arc<InMemoryEventBus>,
    period: Duration,
    prune_after_secs: u64,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = ticker(period);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    sweep_forks(&forks, &bus, prune_after_secs);
                }
                _ = shutdown.changed() => break,
            }
        }
        debug!("Fork sweep stopped");
    })
}

/// Slash equivocators, retry finalization of pending blocks, then drop
/// vote records finalized more than `prune_after_secs` ago.
pub fn spawn_finalization_sweep(
    consensus: Arc<HybridConsensus>,
    bus: Arc<InMemoryEventBus>,
    period: Duration,
    prune_after_secs: u64,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = ticker(period);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    punish_equivocations(&consensus, &bus);
                    sweep_finalizations(&consensus, &bus);
                    consensus.prune_finalized(prune_after_secs);
                }
                _ = shutdown.changed() => break,
            }
        }
        debug!("Finalization sweep stopped");
    })
}

/// Announce the local best height.
pub fn spawn_heartbeat(
    node_id: String,
    graph: Arc<BlockGraph>,
    announcer: GossipAnnouncer,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = ticker(period);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let best_height = graph
                        .tips(1)
                        .first()
                        .and_then(|tip| graph.height_of(tip))
                        .unwrap_or(0);
                    announcer.announce(&GossipMessage::Heartbeat {
                        node_id: node_id.clone(),
                        best_height,
                    });
                }
                _ = shutdown.changed() => break,
            }
        }
        debug!("Heartbeat stopped");
    })
}

/// Feed inbound peer messages to the gossip handler.
pub fn spawn_gossip_listener(
    handler: Arc<GossipHandler>,
    mut inbound: mpsc::Receiver<RawMessage>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                message = inbound.recv() => match message {
                    Some(raw) => handler.process(&raw),
                    None => break,
                },
                _ = shutdown.changed() => break,
            }
        }
        debug!("Gossip listener stopped");
    })
}
