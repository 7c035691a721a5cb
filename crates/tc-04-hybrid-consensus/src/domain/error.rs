//! Error types for the validator layer

use super::{Vote, ValidatorId};
use shared_types::{Hash, StoreError};

/// Every failure carries the tag its caller branches on.
#[derive(Debug, thiserror::Error)]
pub enum ConsensusError {
    #[error("Insufficient stake: {stake} < minimum {min_stake}")]
    InsufficientStake { stake: u128, min_stake: u128 },

    #[error("Validator already registered: {0}")]
    AlreadyRegistered(ValidatorId),

    #[error("Invalid public key for validator {0}")]
    InvalidPublicKey(ValidatorId),

    #[error("Validator not registered: {0}")]
    NotRegistered(ValidatorId),

    #[error("Validator inactive: {0}")]
    Inactive(ValidatorId),

    #[error("Bad vote signature from {validator} on {}", hex::encode(.block))]
    BadSignature { validator: ValidatorId, block: Hash },

    #[error("Hash mismatch for block {}", hex::encode(.0))]
    BadHash(Hash),

    #[error("Proof of work does not meet difficulty {difficulty} for block {}", hex::encode(.block))]
    BadPoW { block: Hash, difficulty: u32 },

    #[error("Bad transaction in block {}: {reason}", hex::encode(.block))]
    BadTransaction { block: Hash, reason: String },

    #[error("Conflicting vote from {validator} on {}: {first:?} then {second:?}", hex::encode(.block))]
    ConflictingVote {
        validator: ValidatorId,
        block: Hash,
        first: Vote,
        second: Vote,
    },

    #[error("Block {} was finalized and its votes pruned", hex::encode(.0))]
    AlreadySettled(Hash),

    #[error("No votes recorded for block {}", hex::encode(.0))]
    UnknownBlock(Hash),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl ConsensusError {
    /// Structural rejections: the block itself is invalid.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::BadSignature { .. }
                | Self::BadHash(_)
                | Self::BadPoW { .. }
                | Self::BadTransaction { .. }
        )
    }
}

pub type ConsensusResult<T> = Result<T, ConsensusError>;
