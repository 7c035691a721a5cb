//! # Fork Resolution (tc-03)
//!
//! Detects blocks that claim the same height, reconstructs the competing
//! chains behind them, and elects exactly one winner per fork.
//!
//! ## Fork Lifecycle
//!
//! ```text
//! detected ──resolve_fork──▶ resolving ──▶ resolved (terminal)
//! ```
//!
//! A fork resolves once; a second `resolve_fork` fails with
//! [`ForkError::AlreadyResolved`].
//!
//! ## Composite Score
//!
//! | Term | Weight | Normalizer |
//! |------|--------|------------|
//! | total difficulty | 0.4 | 1e6 |
//! | total backing stake | 0.3 | 1e4 |
//! | transaction count | 0.2 | 1e3 |
//! | recency | 0.1 | `1 - age/3600s`, floored at 0 |
//!
//! Equal scores are broken by the lexicographically lowest chain id (the hex
//! head hash), so every node elects the same winner from the same inputs.
//!
//! ## Locking
//!
//! The resolver guards its own state with one mutex. Chains are built through
//! [`shared_types::BlockLookup`] before that mutex is taken, so the graph's
//! lock and the resolver's lock are never held together.

pub mod config;
pub mod domain;
pub mod errors;
pub mod service;

pub use config::{ForkChoiceConfig, ScoreWeights};
pub use domain::{elect, Chain, ChainScore, Election, ForkInfo, ForkStats, ForkStatus, ResolutionRule};
pub use errors::{ForkError, ForkResult};
pub use service::ForkResolver;
