//! # Chain
//!
//! Transient fork-resolution view: the blocks from a fork point to a head,
//! plus the aggregates the score is computed from.

use serde::{Deserialize, Serialize};
use shared_types::{hash_hex, Block, Hash};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    /// Lowercase hex of the head hash.
    pub id: String,
    /// Block hashes, fork point first, head last.
    pub blocks: Vec<Hash>,
    pub total_difficulty: u64,
    pub total_stake: u128,
    pub transaction_count: usize,
    pub last_timestamp: u64,
}

impl Chain {
    /// Build from blocks ordered fork point first. Returns `None` when empty.
    pub fn from_blocks(blocks: &[Block]) -> Option<Self> {
        let head = blocks.last()?;
        Some(Self {
            id: hash_hex(&head.hash),
            blocks: blocks.iter().map(|b| b.hash).collect(),
            total_difficulty: blocks.iter().map(|b| u64::from(b.header.difficulty)).sum(),
            total_stake: blocks.iter().filter_map(|b| b.stake_amount).sum(),
            transaction_count: blocks.iter().map(|b| b.transactions.len()).sum(),
            last_timestamp: blocks.iter().map(|b| b.header.timestamp).max().unwrap_or(0),
        })
    }

    pub fn head(&self) -> Option<&Hash> {
        self.blocks.last()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
