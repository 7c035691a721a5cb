//! # Block Graph Service
//!
//! [`BlockGraph`] is shared by every producer and reader. Structural mutation
//! takes one exclusive lock scoped to the in-memory insert; encoding happens
//! before the lock and the store write after it.

use crate::domain::{DagIndex, GraphResult, GraphStats};
use parking_lot::RwLock;
use shared_types::{
    hash_hex, short_hex, Block, BlockLookup, Hash, KeyValueStore, StoreError, Transaction,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Key prefix for persisted blocks: `block:<hex hash>`.
pub const BLOCK_KEY_PREFIX: &str = "block:";

fn block_key(hash: &Hash) -> String {
    format!("{BLOCK_KEY_PREFIX}{}", hash_hex(hash))
}

/// Concurrent, orphan-tolerant block DAG.
#[derive(Default)]
pub struct BlockGraph {
    index: RwLock<DagIndex>,
    store: Option<Arc<dyn KeyValueStore>>,
}

impl BlockGraph {
    /// Create an in-memory graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph that writes every new block through to `store`.
    pub fn with_store(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            index: RwLock::new(DagIndex::new()),
            store: Some(store),
        }
    }

    /// Rebuild a graph from every `block:` entry in `store`.
    ///
    /// The restored graph keeps writing through to the same store.
    pub fn restore(store: Arc<dyn KeyValueStore>) -> GraphResult<Self> {
        let mut index = DagIndex::new();
        for (key, value) in store.prefix_scan(BLOCK_KEY_PREFIX.as_bytes())? {
            let block = Block::from_bytes(&value).map_err(|e| StoreError::Corrupt {
                key: String::from_utf8_lossy(&key).into_owned(),
                reason: e.to_string(),
            })?;
            index.insert(block);
        }
        info!(blocks = index.len(), "Block graph restored from store");

        Ok(Self {
            index: RwLock::new(index),
            store: Some(store),
        })
    }

    /// Insert a block. Returns `Ok(false)` if the hash is already stored.
    ///
    /// Errors only come from the optional store; the in-memory insert has
    /// already happened by then, so the block stays queryable.
    pub fn add_block(&self, block: Block) -> GraphResult<bool> {
        let hash = block.hash;
        let height = block.height();
        let encoded = match &self.store {
            Some(_) => Some(block.to_bytes()?),
            None => None,
        };

        let inserted = self.index.write().insert(block);
        if !inserted {
            debug!(hash = %short_hex(&hash), "Duplicate block ignored");
            return Ok(false);
        }
        debug!(hash = %short_hex(&hash), height, "Block added to graph");

        if let (Some(store), Some(bytes)) = (&self.store, encoded) {
            store.set(block_key(&hash).as_bytes(), &bytes)?;
        }
        Ok(true)
    }

    pub fn get(&self, hash: &Hash) -> Option<Block> {
        self.index.read().get(hash).cloned()
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.index.read().contains(hash)
    }

    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    /// Height of a stored block.
    pub fn height_of(&self, hash: &Hash) -> Option<u64> {
        self.index.read().get(hash).map(Block::height)
    }

    /// Snapshot of up to `limit` open tips.
    pub fn tips(&self, limit: usize) -> Vec<Hash> {
        self.index.read().tips(limit)
    }

    pub fn is_tip(&self, hash: &Hash) -> bool {
        self.index.read().is_tip(hash)
    }

    /// Stored blocks at `height`.
    pub fn blocks_at_height(&self, height: u64) -> Vec<Block> {
        let index = self.index.read();
        index
            .blocks_at_height(height)
            .iter()
            .filter_map(|h| index.get(h).cloned())
            .collect()
    }

    /// Hashes from `hashes` that are not stored locally.
    pub fn missing(&self, hashes: &[Hash]) -> Vec<Hash> {
        self.index.read().missing(hashes)
    }

    pub fn topological_order(&self) -> Vec<Hash> {
        self.index.read().topological_order()
    }

    /// De-duplicated transactions in topological block order.
    pub fn linearized_transactions(&self) -> Vec<Transaction> {
        self.index.read().linearized_transactions()
    }

    pub fn stats(&self) -> GraphStats {
        self.index.read().stats()
    }
}

impl BlockLookup for BlockGraph {
    fn get_block(&self, hash: &Hash) -> Option<Block> {
        self.get(hash)
    }
}
