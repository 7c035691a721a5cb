//! # Genesis Module
//!
//! The genesis block is the single root of the graph:
//!
//! - Height: 0
//! - Parents: none
//! - Merkle root: all-zero (no transactions)
//! - Difficulty: 0
//! - Miner: all-zero, unsigned
//!
//! Its content is fixed by [`GenesisConfig`], so every node started with the
//! same config shares the same genesis hash.

pub mod builder;

pub use builder::{GenesisBuilder, GenesisConfig, GenesisError};
