//! # Stake Ledger
//!
//! Account balances credited by rewards, plus an append-only effect log of
//! every reward, slash and exit. Stake pools live on the validators; the
//! ledger only records money moving in or out of them.
//!
//! Sequence numbers keep counting across [`StakeLedger::trim`], so an
//! effect's sequence is stable once assigned.

use super::ValidatorId;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Hash};
use std::collections::{HashMap, VecDeque};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEffect {
    Reward {
        account: Address,
        amount: u128,
        block: Hash,
    },
    Slash {
        validator: ValidatorId,
        amount: u128,
        reason: String,
    },
    /// Stake returned to the validator's account on voluntary exit.
    Exit {
        validator: ValidatorId,
        amount: u128,
    },
}

#[derive(Debug, Default)]
pub struct StakeLedger {
    balances: HashMap<Address, u128>,
    effects: VecDeque<LedgerEffect>,
    /// Effects dropped from the front of the log.
    trimmed: usize,
    slashed: u128,
}

impl StakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reward(&mut self, account: Address, amount: u128, block: Hash) -> LedgerEffect {
        self.credit(account, amount);
        self.push(LedgerEffect::Reward {
            account,
            amount,
            block,
        })
    }

    /// Record a slash. The stake itself is deducted on the validator.
    pub fn slash(&mut self, validator: &str, amount: u128, reason: &str) -> LedgerEffect {
        self.slashed = self.slashed.saturating_add(amount);
        self.push(LedgerEffect::Slash {
            validator: validator.to_string(),
            amount,
            reason: reason.to_string(),
        })
    }

    pub fn exit(&mut self, validator: &str, account: Address, amount: u128) -> LedgerEffect {
        self.credit(account, amount);
        self.push(LedgerEffect::Exit {
            validator: validator.to_string(),
            amount,
        })
    }

    pub fn balance(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Effects still held in memory, oldest first.
    pub fn effects(&self) -> Vec<LedgerEffect> {
        self.effects.iter().cloned().collect()
    }

    /// Sequence number the next effect will get.
    pub fn next_seq(&self) -> usize {
        self.trimmed + self.effects.len()
    }

    /// Drop the oldest effects so at most `keep` stay in memory.
    pub fn trim(&mut self, keep: usize) -> usize {
        let excess = self.effects.len().saturating_sub(keep);
        self.effects.drain(..excess);
        self.trimmed += excess;
        excess
    }

    /// Total slashed across all validators, trimmed effects included.
    pub fn total_slashed(&self) -> u128 {
        self.slashed
    }

    fn credit(&mut self, account: Address, amount: u128) {
        let balance = self.balances.entry(account).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    fn push(&mut self, effect: LedgerEffect) -> LedgerEffect {
        self.effects.push_back(effect.clone());
        effect
    }
}
