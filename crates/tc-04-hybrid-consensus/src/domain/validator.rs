//! Validator entities

use serde::{Deserialize, Serialize};
use shared_types::PublicKey;

/// Human-chosen validator identifier.
pub type ValidatorId = String;

/// Bounded reputation score in `[MIN, MAX]`.
///
/// All arithmetic saturates at the bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Reputation(u8);

impl Reputation {
    pub const MIN: Reputation = Reputation(0);
    pub const MAX: Reputation = Reputation(100);
    pub const INITIAL: Reputation = Reputation(50);

    pub fn new(value: u8) -> Self {
        Self(value.min(Self::MAX.0))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn raise(self, amount: u8) -> Self {
        Self::new(self.0.saturating_add(amount))
    }

    pub fn lower(self, amount: u8) -> Self {
        Self(self.0.saturating_sub(amount))
    }

    pub fn halve(self) -> Self {
        Self(self.0 / 2)
    }
}

impl Default for Reputation {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// A registered validator. Deactivated validators are kept for audit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub id: ValidatorId,
    /// Verifies this validator's vote signatures; also its reward account.
    pub public_key: PublicKey,
    pub stake: u128,
    pub reputation: Reputation,
    pub vote_power: u128,
    pub is_active: bool,
    /// Yes-votes recorded on blocks.
    pub validated_blocks: u64,
    pub slash_count: u32,
}

impl Validator {
    pub fn new(id: ValidatorId, public_key: PublicKey, stake: u128, vote_power: u128) -> Self {
        Self {
            id,
            public_key,
            stake,
            reputation: Reputation::INITIAL,
            vote_power,
            is_active: true,
            validated_blocks: 0,
            slash_count: 0,
        }
    }

    /// Vote power counted toward quorum right now.
    pub fn active_power(&self) -> u128 {
        if self.is_active {
            self.vote_power
        } else {
            0
        }
    }
}
