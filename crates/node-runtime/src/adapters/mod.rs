//! # Adapters
//!
//! Implementations of the component ports over the node's own services:
//!
//! - [`GraphTips`]: block graph as the miner's [`TipSource`](tc_02_pow_miner::TipSource)
//! - [`LocalValidator`]: the node's vote, and the sync server's [`BlockVerifier`](tc_05_sync_gateway::BlockVerifier)
//! - [`Mempool`]: pending transactions as the miner's [`TransactionSource`](tc_02_pow_miner::TransactionSource)

pub mod graph;
pub mod mempool;
pub mod validator;

pub use graph::GraphTips;
pub use mempool::Mempool;
pub use validator::LocalValidator;
