//! # Hybrid Consensus (tc-04)
//!
//! Stake-weighted validator layer on top of proof-of-work production.
//! Validators vote on blocks entering the graph; a block is finalized once
//! the yes-votes carry two thirds of the vote power active at evaluation
//! time.
//!
//! ## Validator Lifecycle
//!
//! ```text
//! register (stake >= min_stake) ──▶ active ──slash──▶ inactive
//!                                     ▲                  │
//!                                     └────add_stake─────┘
//! ```
//!
//! Slashing is the only involuntary way out of the active set. Deactivated
//! validators are kept for audit, never deleted.
//!
//! ## Quorum
//!
//! `3 · yes_power >= 2 · active_power` in integers, with
//! `vote_power = stake / vote_power_divisor`. Only yes-votes of currently
//! active validators count, so a change in the active set between votes
//! moves the threshold. Blocks that never reach quorum stay `Pending`.
//!
//! ## Finalization Effects
//!
//! | Recipient | Ledger | Reputation |
//! |-----------|--------|------------|
//! | block miner | `miner_reward` | - |
//! | each counted yes-voter | `vote_reward` | +1 |
//! | active validator that did not vote | - | -2 |
//!
//! Reputation lives in `[0, 100]` and only moves through saturating helpers.

pub mod config;
pub mod domain;
pub mod service;

pub use config::ConsensusConfig;
pub use domain::{
    has_quorum, BlockStatus, BlockVotes, ConsensusError, ConsensusResult, Equivocation,
    LedgerEffect, Reputation, StakeLedger, Validator, ValidatorId, Vote,
};
pub use service::{
    ConsensusStats, FinalizeOutcome, Finalization, HybridConsensus, SlashOutcome, VoteReceipt,
    EFFECT_KEY_PREFIX, FINALIZED_KEY_PREFIX,
};
