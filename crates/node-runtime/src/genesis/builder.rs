//! # Genesis Block Builder

use shared_types::{short_hex, Block, BlockHeader, Hash, ZERO_HASH};
use tc_01_block_graph::{BlockGraph, GraphError};
use thiserror::Error;
use tracing::info;

/// Genesis block creation errors.
#[derive(Debug, Error)]
pub enum GenesisError {
    /// The graph already holds a different root at height 0.
    #[error("Graph holds a different genesis at height 0: {0}")]
    Mismatch(String),

    #[error("Failed to store genesis block: {0}")]
    StorageFailed(#[from] GraphError),
}

/// Genesis block configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisConfig {
    /// Genesis timestamp (Unix seconds).
    pub timestamp: u64,
    /// Stake commitment carried by the genesis block.
    pub stake_amount: Option<u128>,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            timestamp: 1_700_000_000,
            stake_amount: None,
        }
    }
}

pub struct GenesisBuilder {
    config: GenesisConfig,
}

impl GenesisBuilder {
    pub fn new(config: GenesisConfig) -> Self {
        Self { config }
    }

    pub fn build(&self) -> Block {
        let block = Block::seal(
            BlockHeader {
                parent_hashes: Vec::new(),
                height: 0,
                merkle_root: ZERO_HASH,
                timestamp: self.config.timestamp,
                difficulty: 0,
                nonce: 0,
                miner_id: ZERO_HASH,
            },
            Vec::new(),
        );
        match self.config.stake_amount {
            Some(stake) => block.with_stake(stake),
            None => block,
        }
    }

    /// Insert genesis into an empty graph. A graph that already has blocks
    /// must contain this genesis. Returns the genesis hash.
    pub fn ensure(&self, graph: &BlockGraph) -> Result<Hash, GenesisError> {
        let genesis = self.build();
        if graph.is_empty() {
            graph.add_block(genesis.clone())?;
            info!(hash = %short_hex(&genesis.hash), "Genesis block created");
            return Ok(genesis.hash);
        }

        if graph.contains(&genesis.hash) {
            return Ok(genesis.hash);
        }
        let existing = graph
            .blocks_at_height(0)
            .first()
            .map(|b| short_hex(&b.hash))
            .unwrap_or_else(|| "none".to_string());
        Err(GenesisError::Mismatch(existing))
    }
}
