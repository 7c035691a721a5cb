//! # Node Runtime Library
//!
//! Wires the Tangle-Chain components into a running node. The binary in
//! `main.rs` is a thin shell over [`NodeRuntime`].
//!
//! ## Modular Structure
//!
//! - `container/` - configuration and component construction
//! - `genesis/` - deterministic genesis block
//! - `adapters/` - port implementations over the node's services
//! - `handlers/` - ingestion pipeline, gossip boundary, sweep passes
//! - `wiring/` - mining threads and scheduled tasks
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults, then `TC_*` environment overrides)
//! 2. Build the container; the graph is restored from the store
//! 3. Create genesis if the graph is empty
//! 4. Start scheduled tasks and the gossip listener
//! 5. Start mining threads and the mined-block consumer (if enabled)

pub mod adapters;
pub mod container;
pub mod genesis;
pub mod handlers;
pub mod wiring;

pub use container::{ConfigError, NodeConfig, NodeContainer, NodeError};

use crate::genesis::{GenesisBuilder, GenesisConfig};
use crate::handlers::{GossipAnnouncer, GossipHandler};
use parking_lot::Mutex;
use shared_bus::{EventFilter, RawMessage, Subscription};
use shared_types::Hash;
use std::sync::Arc;
use tc_02_pow_miner::MiningWorker;
use tc_05_sync_gateway::SyncServer;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// The running node: container plus every task it owns.
pub struct NodeRuntime {
    container: Arc<NodeContainer>,
    gossip: Arc<GossipHandler>,
    genesis: GenesisConfig,
    inbound_tx: mpsc::Sender<RawMessage>,
    inbound_rx: Mutex<Option<mpsc::Receiver<RawMessage>>>,
    outbound_tx: mpsc::Sender<RawMessage>,
    outbound_rx: Mutex<Option<mpsc::Receiver<RawMessage>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    miners: Mutex<Option<MiningWorker>>,
    /// Shutdown signal sender.
    shutdown_tx: watch::Sender<bool>,
    /// Shutdown signal receiver.
    shutdown_rx: watch::Receiver<bool>,
}

impl NodeRuntime {
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        Ok(Self::with_container(NodeContainer::new(config)?))
    }

    pub fn with_container(container: NodeContainer) -> Self {
        let capacity = container.config.node.gossip_capacity.max(1);
        let (inbound_tx, inbound_rx) = mpsc::channel(capacity);
        let (outbound_tx, outbound_rx) = mpsc::channel(capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let gossip = Arc::new(GossipHandler::new(
            container.config.node.node_id.clone(),
            container.graph.clone(),
            container.mempool.clone(),
            container.wanted.clone(),
            Arc::clone(&container.time),
        ));

        Self {
            container: Arc::new(container),
            gossip,
            genesis: GenesisConfig::default(),
            inbound_tx,
            inbound_rx: Mutex::new(Some(inbound_rx)),
            outbound_tx,
            outbound_rx: Mutex::new(Some(outbound_rx)),
            tasks: Mutex::new(Vec::new()),
            miners: Mutex::new(None),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Use a non-default genesis. Must be set before `start()`.
    pub fn with_genesis(mut self, genesis: GenesisConfig) -> Self {
        self.genesis = genesis;
        self
    }

    /// Create genesis if needed and start every task. Returns the genesis hash.
    pub async fn start(&self) -> Result<Hash, NodeError> {
        let c = &self.container;
        info!(node_id = %c.config.node.node_id, "Starting Tangle-Chain node");

        let genesis = GenesisBuilder::new(self.genesis.clone()).ensure(&c.graph)?;

        let announcer = GossipAnnouncer::new(self.outbound_tx.clone(), Arc::clone(&c.time));
        let tasks_config = &c.config.tasks;
        let mut tasks = vec![
            wiring::spawn_fork_sweep(
                c.forks.clone(),
                c.bus.clone(),
                tasks_config.fork_sweep(),
                tasks_config.prune_resolved_after_secs,
                self.shutdown_rx.clone(),
            ),
            wiring::spawn_finalization_sweep(
                c.consensus.clone(),
                c.bus.clone(),
                tasks_config.finalize_sweep(),
                tasks_config.prune_finalized_after_secs,
                self.shutdown_rx.clone(),
            ),
            wiring::spawn_heartbeat(
                c.config.node.node_id.clone(),
                c.graph.clone(),
                announcer.clone(),
                tasks_config.heartbeat(),
                self.shutdown_rx.clone(),
            ),
        ];
        if let Some(inbound) = self.inbound_rx.lock().take() {
            tasks.push(wiring::spawn_gossip_listener(
                self.gossip.clone(),
                inbound,
                self.shutdown_rx.clone(),
            ));
        }

        if c.config.node.mining_enabled {
            let (mined_tx, mined_rx) = mpsc::channel(c.config.mining.threads.max(1) * 2);
            let worker = wiring::start_mining(c, mined_tx)?;
            info!(threads = worker.thread_count(), "Mining enabled");
            *self.miners.lock() = Some(worker);
            tasks.push(wiring::spawn_block_consumer(
                c.ingestion.clone(),
                Arc::clone(&c.keypair),
                announcer,
                mined_rx,
                self.shutdown_rx.clone(),
            ));
        }

        self.tasks.lock().extend(tasks);
        info!(genesis = %shared_types::short_hex(&genesis), "Node started");
        Ok(genesis)
    }

    /// Signal every task, stop mining threads and wait for all of them.
    pub async fn shutdown(&self) {
        info!("Shutting down node runtime");
        let _ = self.shutdown_tx.send(true);

        let miners = self.miners.lock().take();
        if let Some(worker) = miners {
            if let Err(e) = tokio::task::spawn_blocking(move || worker.shutdown()).await {
                warn!(error = %e, "Mining shutdown failed");
            }
            let metrics = self.container.miner.metrics();
            info!(
                blocks_mined = metrics.get_blocks_mined(),
                hash_rate = metrics.get_hash_rate(),
                "Mining summary"
            );
        }

        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.tasks.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Task ended abnormally");
            }
        }
        info!("Node runtime stopped");
    }

    pub fn container(&self) -> &Arc<NodeContainer> {
        &self.container
    }

    pub fn gossip(&self) -> &Arc<GossipHandler> {
        &self.gossip
    }

    /// Where the peer layer delivers inbound gossip.
    pub fn gossip_sender(&self) -> mpsc::Sender<RawMessage> {
        self.inbound_tx.clone()
    }

    /// Outbound gossip for the peer layer. Can be taken once.
    pub fn take_outbound(&self) -> Option<mpsc::Receiver<RawMessage>> {
        self.outbound_rx.lock().take()
    }

    /// The validating side of remote block submission.
    pub fn sync_server(&self) -> Arc<SyncServer> {
        self.container.sync_server.clone()
    }

    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.container.bus.subscribe(filter)
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_rx.borrow()
    }
}
