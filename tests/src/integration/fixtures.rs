//! Shared fixtures: deterministic keys, a fixed clock, block builders.

use node_runtime::{NodeConfig, NodeContainer};
use shared_crypto::Ed25519KeyPair;
use shared_types::{
    compute_merkle_root, Block, BlockHeader, FixedTimeSource, Hash, InMemoryKVStore, MinerId,
    Transaction,
};
use std::sync::Arc;

pub const NOW: u64 = 1_700_000_000;

pub fn clock() -> Arc<FixedTimeSource> {
    Arc::new(FixedTimeSource::new(NOW))
}

pub fn key(seed: u8) -> Ed25519KeyPair {
    Ed25519KeyPair::from_seed([seed; 32])
}

pub fn transfer(nonce: u64) -> Transaction {
    Transaction::transfer([0xA1; 32], [0xB2; 32], 100, 1, nonce)
}

/// Difficulty-0 block at `NOW`.
pub fn block(parents: &[Hash], height: u64, nonce: u64, miner: MinerId) -> Block {
    block_with(parents, height, nonce, miner, Vec::new())
}

pub fn block_with(
    parents: &[Hash],
    height: u64,
    nonce: u64,
    miner: MinerId,
    transactions: Vec<Transaction>,
) -> Block {
    let hashes: Vec<Hash> = transactions.iter().map(Transaction::hash).collect();
    Block::seal(
        BlockHeader {
            parent_hashes: parents.to_vec(),
            height,
            merkle_root: compute_merkle_root(&hashes),
            timestamp: NOW,
            difficulty: 0,
            nonce,
            miner_id: miner,
        },
        transactions,
    )
}

/// A validating node with mining off.
pub fn node_config(seed: u8) -> NodeConfig {
    let mut config = NodeConfig::default();
    config.node.node_id = format!("node-{seed}");
    config.node.key_seed = Some(hex::encode([seed; 32]));
    config.node.mining_enabled = false;
    config.mining.difficulty = 0;
    config
}

/// Container on a fresh store and the fixed clock.
pub fn node(seed: u8, clock: Arc<FixedTimeSource>) -> NodeContainer {
    NodeContainer::with_parts(node_config(seed), Arc::new(InMemoryKVStore::new()), clock)
        .expect("node config is valid")
}
