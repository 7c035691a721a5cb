//! # Node Container
//!
//! Builds every component once and hands out shared handles.
//!
//! ## Construction Order
//!
//! 1. Validate configuration, load or generate the node key
//! 2. Block graph, restored from the store
//! 3. Fork resolver over the graph
//! 4. Consensus, with the local validator registered when staked
//! 5. Mempool, wanted set, event bus
//! 6. Ingestion pipeline, then the sync server feeding it

pub mod config;

pub use config::{ConfigError, NodeConfig, NodeSettings, TaskConfig};

use crate::adapters::{LocalValidator, Mempool};
use crate::genesis::GenesisError;
use crate::handlers::{BlockIngestion, WantedBlocks};
use shared_bus::InMemoryEventBus;
use shared_crypto::Ed25519KeyPair;
use shared_types::{InMemoryKVStore, KeyValueStore, SystemTimeSource, TimeSource};
use std::sync::Arc;
use tc_01_block_graph::{BlockGraph, GraphError};
use tc_02_pow_miner::{MiningError, ProofOfWorkMiner};
use tc_03_fork_resolution::ForkResolver;
use tc_04_hybrid_consensus::{ConsensusError, HybridConsensus};
use tc_05_sync_gateway::SyncServer;
use thiserror::Error;
use tracing::info;

/// Errors raised while building or starting the node.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Consensus(#[from] ConsensusError),

    #[error(transparent)]
    Mining(#[from] MiningError),

    #[error(transparent)]
    Genesis(#[from] GenesisError),
}

/// Every component of a running node.
pub struct NodeContainer {
    pub config: NodeConfig,
    pub time: Arc<dyn TimeSource>,
    pub store: Arc<dyn KeyValueStore>,
    pub keypair: Arc<Ed25519KeyPair>,
    pub graph: Arc<BlockGraph>,
    pub forks: Arc<ForkResolver>,
    pub consensus: Arc<HybridConsensus>,
    pub miner: Arc<ProofOfWorkMiner>,
    pub validator: Arc<LocalValidator>,
    pub mempool: Arc<Mempool>,
    pub wanted: Arc<WantedBlocks>,
    pub bus: Arc<InMemoryEventBus>,
    pub ingestion: Arc<BlockIngestion>,
    pub sync_server: Arc<SyncServer>,
}

impl NodeContainer {
    /// Build with an in-memory store and the system clock.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        Self::with_parts(config, Arc::new(InMemoryKVStore::new()), Arc::new(SystemTimeSource))
    }

    /// Build over an existing store and clock.
    pub fn with_parts(
        config: NodeConfig,
        store: Arc<dyn KeyValueStore>,
        time: Arc<dyn TimeSource>,
    ) -> Result<Self, NodeError> {
        config.validate()?;

        let keypair = Arc::new(match config.node.seed()? {
            Some(seed) => Ed25519KeyPair::from_seed(seed),
            None => Ed25519KeyPair::generate(),
        });

        let graph = Arc::new(BlockGraph::restore(Arc::clone(&store))?);
        let forks = Arc::new(ForkResolver::with_time_source(
            graph.clone(),
            config.fork_choice.clone(),
            Arc::clone(&time),
        ));
        let consensus = Arc::new(
            HybridConsensus::new(config.consensus.clone())
                .with_time_source(Arc::clone(&time))
                .with_store(Arc::clone(&store)),
        );
        if config.node.validator_stake > 0 {
            consensus.register_validator(
                &config.node.node_id,
                keypair.identity(),
                config.node.validator_stake,
            )?;
        }

        let miner = Arc::new(ProofOfWorkMiner::with_time_source(
            config.mining.cancel_check_interval,
            Arc::clone(&time),
        ));
        let validator = Arc::new(LocalValidator::new(
            config.node.node_id.clone(),
            Arc::clone(&keypair),
            consensus.clone(),
        ));
        let mempool = Arc::new(Mempool::new(config.node.mempool_capacity));
        let wanted = Arc::new(WantedBlocks::with_capacity(config.node.wanted_capacity));
        let bus = Arc::new(InMemoryEventBus::with_capacity(config.node.event_capacity));

        let ingestion = Arc::new(BlockIngestion::new(
            graph.clone(),
            forks.clone(),
            consensus.clone(),
            validator.clone(),
            mempool.clone(),
            wanted.clone(),
            bus.clone(),
        ));
        let sync_server = Arc::new(
            SyncServer::new(validator.clone(), ingestion.clone(), config.sync.clone())
                .with_time_source(Arc::clone(&time)),
        );

        info!(
            node_id = %config.node.node_id,
            identity = %hex::encode(keypair.identity()),
            restored_blocks = graph.len(),
            validator = config.node.validator_stake > 0,
            "Node container ready"
        );

        Ok(Self {
            config,
            time,
            store,
            keypair,
            graph,
            forks,
            consensus,
            miner,
            validator,
            mempool,
            wanted,
            bus,
            ingestion,
            sync_server,
        })
    }
}
