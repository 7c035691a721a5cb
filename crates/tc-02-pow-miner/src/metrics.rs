//! Metrics collection for mining

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters shared by every mining worker
#[derive(Debug, Default)]
pub struct MiningMetrics {
    /// Hashes computed
    pub hashes_attempted: AtomicU64,

    /// Searches that found a nonce
    pub blocks_mined: AtomicU64,

    /// Searches abandoned on the stop flag
    pub searches_cancelled: AtomicU64,

    /// Total search time (milliseconds)
    pub mining_time_ms: AtomicU64,
}

impl MiningMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, attempts: u64, duration_ms: u64) {
        self.hashes_attempted.fetch_add(attempts, Ordering::Relaxed);
        self.blocks_mined.fetch_add(1, Ordering::Relaxed);
        self.mining_time_ms.fetch_add(duration_ms, Ordering::Relaxed);
    }

    pub fn record_cancelled(&self, attempts: u64, duration_ms: u64) {
        self.hashes_attempted.fetch_add(attempts, Ordering::Relaxed);
        self.searches_cancelled.fetch_add(1, Ordering::Relaxed);
        self.mining_time_ms.fetch_add(duration_ms, Ordering::Relaxed);
    }

    pub fn get_blocks_mined(&self) -> u64 {
        self.blocks_mined.load(Ordering::Relaxed)
    }

    pub fn get_hashes_attempted(&self) -> u64 {
        self.hashes_attempted.load(Ordering::Relaxed)
    }

    /// Average hashes per second over all recorded searches
    pub fn get_hash_rate(&self) -> f64 {
        let ms = self.mining_time_ms.load(Ordering::Relaxed);
        if ms == 0 {
            return 0.0;
        }
        self.get_hashes_attempted() as f64 * 1000.0 / ms as f64
    }
}
