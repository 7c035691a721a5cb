//! Configuration types for mining

use serde::Deserialize;

/// Upper bound on worker threads regardless of core count.
pub const MAX_MINING_THREADS: usize = 64;

/// Proof-of-work configuration
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PowConfig {
    /// Required leading zero hex characters (0 mines instantly)
    pub difficulty: u32,

    /// Dedicated mining threads (default: num_cpus, capped)
    pub threads: usize,

    /// Parents referenced by a new candidate, taken from the highest tips
    pub max_parents: usize,

    /// Nonces tried between stop-flag checks
    pub cancel_check_interval: u64,

    /// Transactions pulled into each candidate
    pub max_block_transactions: usize,

    /// Idle time a worker waits after emitting a block (milliseconds)
    pub block_pause_ms: u64,
}

impl Default for PowConfig {
    fn default() -> Self {
        Self {
            difficulty: 4,
            threads: num_cpus::get().clamp(1, MAX_MINING_THREADS),
            max_parents: 4,
            cancel_check_interval: 10_000,
            max_block_transactions: 500,
            block_pause_ms: 1_000,
        }
    }
}
