//! # Nonce Search
//!
//! `hash = SHA256(parents ‖ height ‖ merkle_root ‖ timestamp ‖ difficulty ‖ nonce ‖ miner_id)`;
//! the first nonce whose hash has at least `difficulty` leading zero hex
//! characters wins. The timestamp is sampled once per header, never per
//! attempt.

use crate::error::{MiningError, Result};
use crate::metrics::MiningMetrics;
use shared_types::{
    block_hash, meets_difficulty, short_hex, BlockHeader, Hash, MinerId, SystemTimeSource,
    TimeSource, MAX_DIFFICULTY,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Everything the search needs besides the nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningJob {
    pub parents: Vec<Hash>,
    pub height: u64,
    pub merkle_root: Hash,
    pub difficulty: u32,
    pub miner_id: MinerId,
    /// First nonce tried; workers start at disjoint offsets.
    pub start_nonce: u64,
}

/// Proof-of-work nonce searcher
pub struct ProofOfWorkMiner {
    time: Arc<dyn TimeSource>,
    metrics: Arc<MiningMetrics>,
    cancel_check_interval: u64,
}

impl ProofOfWorkMiner {
    pub fn new(cancel_check_interval: u64) -> Self {
        Self::with_time_source(cancel_check_interval, Arc::new(SystemTimeSource))
    }

    pub fn with_time_source(cancel_check_interval: u64, time: Arc<dyn TimeSource>) -> Self {
        Self {
            time,
            metrics: Arc::new(MiningMetrics::new()),
            cancel_check_interval: cancel_check_interval.max(1),
        }
    }

    pub fn metrics(&self) -> Arc<MiningMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Search until a nonce satisfies `difficulty`. Not preemptible.
    ///
    /// Difficulty 0 accepts the first nonce. Callers needing cancellation
    /// race this against their own signal and discard the result, or use
    /// [`Self::mine_until`].
    pub fn mine(
        &self,
        parents: Vec<Hash>,
        height: u64,
        merkle_root: Hash,
        difficulty: u32,
        miner_id: MinerId,
    ) -> Result<BlockHeader> {
        let job = MiningJob {
            parents,
            height,
            merkle_root,
            difficulty,
            miner_id,
            start_nonce: 0,
        };
        self.search(&job, None)
    }

    /// Like [`Self::mine`], but gives up once `stop` is raised.
    pub fn mine_until(
        &self,
        parents: Vec<Hash>,
        height: u64,
        merkle_root: Hash,
        difficulty: u32,
        miner_id: MinerId,
        stop: &AtomicBool,
    ) -> Result<BlockHeader> {
        let job = MiningJob {
            parents,
            height,
            merkle_root,
            difficulty,
            miner_id,
            start_nonce: 0,
        };
        self.search(&job, Some(stop))
    }

    /// Run a search for `job`, polling `stop` between work units if given.
    #[tracing::instrument(skip(self, job, stop), fields(height = job.height, difficulty = job.difficulty))]
    pub fn search(&self, job: &MiningJob, stop: Option<&AtomicBool>) -> Result<BlockHeader> {
        if job.difficulty > MAX_DIFFICULTY {
            return Err(MiningError::DifficultyTooHigh {
                requested: job.difficulty,
                max: MAX_DIFFICULTY,
            });
        }

        let timestamp = self.time.now();
        let started = Instant::now();
        let mut attempts: u64 = 0;

        loop {
            if let Some(stop) = stop {
                if attempts % self.cancel_check_interval == 0 && stop.load(Ordering::Relaxed) {
                    let elapsed = started.elapsed().as_millis() as u64;
                    self.metrics.record_cancelled(attempts, elapsed);
                    debug!(attempts, "Mining cancelled");
                    return Err(MiningError::Cancelled { attempts });
                }
            }

            let nonce = job.start_nonce.wrapping_add(attempts);
            let hash = block_hash(
                &job.parents,
                job.height,
                &job.merkle_root,
                timestamp,
                job.difficulty,
                nonce,
                &job.miner_id,
            );
            attempts += 1;

            if meets_difficulty(&hash, job.difficulty) {
                let elapsed = started.elapsed().as_millis() as u64;
                self.metrics.record_success(attempts, elapsed);
                debug!(hash = %short_hex(&hash), nonce, attempts, "Nonce found");
                return Ok(BlockHeader {
                    parent_hashes: job.parents.clone(),
                    height: job.height,
                    merkle_root: job.merkle_root,
                    timestamp,
                    difficulty: job.difficulty,
                    nonce,
                    miner_id: job.miner_id,
                });
            }

            if attempts == u64::MAX {
                return Err(MiningError::NonceSpaceExhausted);
            }
        }
    }
}
