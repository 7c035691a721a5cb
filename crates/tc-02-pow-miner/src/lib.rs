//! # Proof-of-Work Miner (tc-02)
//!
//! Searches for a nonce whose block hash carries at least `difficulty`
//! leading zero hex characters, and builds candidates against the graph's
//! current tips.
//!
//! ## Threading
//!
//! The nonce search is the only CPU-bound, unbounded-latency operation in the
//! engine. It runs on dedicated `std::thread` workers ([`MiningWorker`]) and
//! never on a thread that services messages or votes.
//!
//! - [`ProofOfWorkMiner::mine`] runs to completion (baseline semantics).
//! - [`ProofOfWorkMiner::mine_until`] polls a stop flag every
//!   `cancel_check_interval` nonces and returns [`MiningError::Cancelled`].
//!
//! ## Crate Structure
//!
//! - `domain/` - nonce search and candidate assembly
//! - `ports/` - what the miner needs from the host (tips, transactions)
//! - `worker.rs` - dedicated mining threads
//! - `config.rs`, `error.rs`, `metrics.rs`

pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod worker;

pub use config::PowConfig;
pub use domain::{Candidate, CandidateBuilder, MiningJob, ProofOfWorkMiner};
pub use error::{MiningError, Result};
pub use metrics::MiningMetrics;
pub use ports::{NoTransactions, TipSource, TransactionSource};
pub use worker::{MinedBlock, MiningWorker};
