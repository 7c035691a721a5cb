//! # Local Validator
//!
//! Votes on behalf of this node. The vote signature is made with the node
//! key over the block hash, so `validate_block` can check it like any
//! other validator's.
//!
//! As the sync server's [`BlockVerifier`], a registered and active node
//! records its yes-vote while verifying. A node without voting rights still
//! checks the block body.

use shared_crypto::{sign_vote, Ed25519KeyPair};
use shared_types::Block;
use std::sync::Arc;
use tc_04_hybrid_consensus::{ConsensusError, ConsensusResult, HybridConsensus, VoteReceipt};
use tc_05_sync_gateway::BlockVerifier;

pub struct LocalValidator {
    id: String,
    keypair: Arc<Ed25519KeyPair>,
    consensus: Arc<HybridConsensus>,
}

impl LocalValidator {
    pub fn new(id: impl Into<String>, keypair: Arc<Ed25519KeyPair>, consensus: Arc<HybridConsensus>) -> Self {
        Self {
            id: id.into(),
            keypair,
            consensus,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Registered and currently active.
    pub fn can_vote(&self) -> bool {
        self.consensus
            .validator(&self.id)
            .is_some_and(|v| v.is_active)
    }

    /// Validate `block` and record this node's yes-vote.
    pub fn vote(&self, block: &Block) -> ConsensusResult<VoteReceipt> {
        let signature = sign_vote(&block.hash, &self.keypair);
        self.consensus.validate_block(block, &signature, &self.id)
    }
}

/// Body checks for nodes that cannot vote.
fn check_body(block: &Block) -> Result<(), String> {
    if !block.verify_merkle_root() {
        return Err("merkle root does not match transactions".to_string());
    }
    if block.transactions.iter().any(|tx| !tx.is_structurally_sound()) {
        return Err("block carries a malformed transaction".to_string());
    }
    Ok(())
}

impl BlockVerifier for LocalValidator {
    fn verify(&self, block: &Block) -> Result<(), String> {
        match self.vote(block) {
            Ok(_) => Ok(()),
            Err(ConsensusError::NotRegistered(_) | ConsensusError::Inactive(_)) => check_body(block),
            Err(e) => Err(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{BlockHeader, Transaction, ZERO_HASH};
    use tc_04_hybrid_consensus::{BlockStatus, ConsensusConfig};

    fn block(transactions: Vec<Transaction>) -> Block {
        let hashes: Vec<_> = transactions.iter().map(Transaction::hash).collect();
        Block::seal(
            BlockHeader {
                parent_hashes: vec![[1u8; 32]],
                height: 1,
                merkle_root: shared_types::compute_merkle_root(&hashes),
                timestamp: 1_700_000_000,
                difficulty: 0,
                nonce: 0,
                miner_id: [5u8; 32],
            },
            transactions,
        )
    }

    fn validator(stake: Option<u128>) -> (LocalValidator, Arc<HybridConsensus>) {
        let keypair = Arc::new(Ed25519KeyPair::from_seed([4u8; 32]));
        let consensus = Arc::new(HybridConsensus::new(ConsensusConfig::default()));
        if let Some(stake) = stake {
            consensus
                .register_validator("local", keypair.identity(), stake)
                .unwrap();
        }
        (LocalValidator::new("local", keypair, consensus.clone()), consensus)
    }

    #[test]
    fn test_vote_is_recorded() {
        let (local, consensus) = validator(Some(1_000));
        let block = block(vec![]);

        let receipt = local.vote(&block).unwrap();
        assert!(receipt.has_consensus);
        assert_eq!(consensus.block_status(&block.hash), Some(BlockStatus::Pending));
    }

    #[test]
    fn test_verifier_records_vote_when_active() {
        let (local, consensus) = validator(Some(1_000));
        let block = block(vec![]);

        assert!(local.can_vote());
        assert_eq!(local.verify(&block), Ok(()));
        assert!(consensus.has_consensus(&block.hash));
    }

    #[test]
    fn test_verifier_without_voting_rights_checks_body() {
        let (local, consensus) = validator(None);
        assert!(!local.can_vote());

        assert_eq!(local.verify(&block(vec![])), Ok(()));
        assert!(consensus.pending_blocks().is_empty());

        let mut bad = block(vec![Transaction::transfer([1u8; 32], [2u8; 32], 5, 1, 0)]);
        bad.header.merkle_root = ZERO_HASH;
        bad.hash = bad.header.hash();
        assert!(local.verify(&bad).unwrap_err().contains("merkle"));
    }

    #[test]
    fn test_verifier_reports_structural_failure() {
        let (local, _) = validator(Some(1_000));
        let mut bad = block(vec![]);
        bad.hash = [0xAB; 32];

        assert!(local.verify(&bad).is_err());
    }
}
