//! # Candidate Assembly
//!
//! A candidate references the highest open tips as parents and sits one
//! above the highest of them. With no tips at all it is a genesis candidate.

use crate::domain::miner::MiningJob;
use crate::ports::TipSource;
use shared_types::{compute_merkle_root, Block, BlockHeader, Hash, MinerId, Transaction};
use std::sync::Arc;

/// An unmined block: parents, height and contents are fixed, nonce is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub parents: Vec<Hash>,
    pub height: u64,
    pub merkle_root: Hash,
    pub transactions: Vec<Transaction>,
    pub difficulty: u32,
    pub miner_id: MinerId,
}

impl Candidate {
    /// Search parameters for this candidate starting at `start_nonce`.
    pub fn job(&self, start_nonce: u64) -> MiningJob {
        MiningJob {
            parents: self.parents.clone(),
            height: self.height,
            merkle_root: self.merkle_root,
            difficulty: self.difficulty,
            miner_id: self.miner_id,
            start_nonce,
        }
    }

    /// Attach the mined header and seal the block.
    pub fn into_block(self, header: BlockHeader) -> Block {
        Block::seal(header, self.transactions)
    }
}

/// Builds candidates against the current tips.
pub struct CandidateBuilder {
    tips: Arc<dyn TipSource>,
    max_parents: usize,
}

impl CandidateBuilder {
    pub fn new(tips: Arc<dyn TipSource>, max_parents: usize) -> Self {
        Self {
            tips,
            max_parents: max_parents.max(1),
        }
    }

    pub fn build(
        &self,
        transactions: Vec<Transaction>,
        difficulty: u32,
        miner_id: MinerId,
    ) -> Candidate {
        let parents = self.tips.tips(self.max_parents);
        let height = parents
            .iter()
            .filter_map(|p| self.tips.height_of(p))
            .max()
            .map_or(0, |h| h + 1);

        let tx_hashes: Vec<Hash> = transactions.iter().map(Transaction::hash).collect();
        Candidate {
            parents,
            height,
            merkle_root: compute_merkle_root(&tx_hashes),
            transactions,
            difficulty,
            miner_id,
        }
    }
}
