//! # Vote Ledger
//!
//! One [`BlockVotes`] per candidate block: validator id to yes/no. A
//! validator may repeat a vote but never flip it; a flip is equivocation and
//! is kept as [`Equivocation`] evidence.

use super::ValidatorId;
use serde::{Deserialize, Serialize};
use shared_types::{Hash, MinerId};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vote {
    Yes,
    No,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockStatus {
    Pending,
    Finalized,
}

/// Proof that a validator cast opposite votes on one block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equivocation {
    pub validator: ValidatorId,
    pub block: Hash,
    pub first: Vote,
    pub second: Vote,
}

/// Outcome of recording a vote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Recorded {
    New,
    Repeated,
    Conflict(Equivocation),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockVotes {
    pub block: Hash,
    pub height: u64,
    pub miner: MinerId,
    pub votes: HashMap<ValidatorId, Vote>,
    pub status: BlockStatus,
    /// Unix seconds of the first vote.
    pub first_seen: u64,
    pub finalized_at: Option<u64>,
}

impl BlockVotes {
    pub fn new(block: Hash, height: u64, miner: MinerId, first_seen: u64) -> Self {
        Self {
            block,
            height,
            miner,
            votes: HashMap::new(),
            status: BlockStatus::Pending,
            first_seen,
            finalized_at: None,
        }
    }

    pub fn record(&mut self, validator: &str, vote: Vote) -> Recorded {
        match self.votes.get(validator) {
            None => {
                self.votes.insert(validator.to_string(), vote);
                Recorded::New
            }
            Some(previous) if *previous == vote => Recorded::Repeated,
            Some(previous) => Recorded::Conflict(Equivocation {
                validator: validator.to_string(),
                block: self.block,
                first: *previous,
                second: vote,
            }),
        }
    }

    pub fn vote_of(&self, validator: &str) -> Option<Vote> {
        self.votes.get(validator).copied()
    }

    pub fn yes_voters(&self) -> impl Iterator<Item = &ValidatorId> {
        self.votes
            .iter()
            .filter(|(_, v)| **v == Vote::Yes)
            .map(|(id, _)| id)
    }

    pub fn is_finalized(&self) -> bool {
        self.status == BlockStatus::Finalized
    }
}

/// `yes_power >= 2/3 · active_power` in integer arithmetic.
///
/// Zero active power never reaches quorum.
pub fn has_quorum(yes_power: u128, active_power: u128) -> bool {
    active_power > 0 && yes_power.saturating_mul(3) >= active_power.saturating_mul(2)
}
