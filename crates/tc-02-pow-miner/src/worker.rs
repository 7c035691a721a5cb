//! # Mining Workers
//!
//! Each worker owns a dedicated OS thread: build a candidate from the current
//! tips, search from the worker's own nonce offset, hand the block to the
//! output channel, pause, repeat. Raising the shared stop flag ends every
//! search at its next check.

use crate::config::PowConfig;
use crate::domain::{CandidateBuilder, ProofOfWorkMiner};
use crate::error::{MiningError, Result};
use crate::ports::TransactionSource;
use shared_types::{short_hex, Block, MinerId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

const PAUSE_SLICE: Duration = Duration::from_millis(50);

/// A block produced by one of the workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinedBlock {
    pub block: Block,
    pub worker: usize,
}

/// Everything a worker thread shares with its siblings.
#[derive(Clone)]
struct WorkerContext {
    miner: Arc<ProofOfWorkMiner>,
    builder: Arc<CandidateBuilder>,
    transactions: Arc<dyn TransactionSource>,
    miner_id: MinerId,
    difficulty: u32,
    max_transactions: usize,
    pause: Duration,
    stop: Arc<AtomicBool>,
    output: mpsc::Sender<MinedBlock>,
}

/// Handle over a pool of dedicated mining threads.
pub struct MiningWorker {
    stop: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl MiningWorker {
    /// Start `config.threads` workers.
    pub fn spawn(
        config: &PowConfig,
        miner: Arc<ProofOfWorkMiner>,
        builder: Arc<CandidateBuilder>,
        transactions: Arc<dyn TransactionSource>,
        miner_id: MinerId,
        output: mpsc::Sender<MinedBlock>,
    ) -> Result<Self> {
        let threads = config.threads.max(1);
        let stop = Arc::new(AtomicBool::new(false));
        let context = WorkerContext {
            miner,
            builder,
            transactions,
            miner_id,
            difficulty: config.difficulty,
            max_transactions: config.max_block_transactions,
            pause: Duration::from_millis(config.block_pause_ms),
            stop: Arc::clone(&stop),
            output,
        };

        // Disjoint nonce ranges so workers never repeat each other's work.
        let stride = u64::MAX / threads as u64;
        let mut handles = Vec::with_capacity(threads);
        for id in 0..threads {
            let context = context.clone();
            let start_nonce = stride.saturating_mul(id as u64);
            let spawned = std::thread::Builder::new()
                .name(format!("tc-miner-{id}"))
                .spawn(move || run_worker(id, start_nonce, context));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    stop.store(true, Ordering::Relaxed);
                    return Err(MiningError::WorkerSpawn(e.to_string()));
                }
            }
        }

        info!(threads, difficulty = config.difficulty, "Mining workers started");
        Ok(Self { stop, handles })
    }

    /// The flag every worker polls.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn thread_count(&self) -> usize {
        self.handles.len()
    }

    /// Raise the stop flag and wait for every worker to exit.
    pub fn shutdown(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                warn!("Mining worker panicked");
            }
        }
        info!("Mining workers stopped");
    }
}

impl Drop for MiningWorker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

fn run_worker(id: usize, start_nonce: u64, ctx: WorkerContext) {
    debug!(worker = id, start_nonce, "Mining worker running");

    while !ctx.stop.load(Ordering::Relaxed) {
        let transactions = ctx.transactions.pending(ctx.max_transactions);
        let candidate = ctx.builder.build(transactions, ctx.difficulty, ctx.miner_id);

        match ctx.miner.search(&candidate.job(start_nonce), Some(&ctx.stop)) {
            Ok(header) => {
                let block = candidate.into_block(header);
                debug!(worker = id, hash = %short_hex(&block.hash), height = block.height(), "Block mined");
                if !deliver(&ctx, MinedBlock { block, worker: id }) {
                    break;
                }
            }
            Err(MiningError::Cancelled { .. }) => break,
            Err(e) => {
                warn!(worker = id, error = %e, "Mining worker giving up");
                break;
            }
        }

        pause(&ctx.stop, ctx.pause);
    }
}

/// Hand a block to the output channel, backing off while it is full.
///
/// Returns `false` when the worker should exit (channel closed or stop raised).
fn deliver(ctx: &WorkerContext, mined: MinedBlock) -> bool {
    let mut pending = mined;
    loop {
        match ctx.output.try_send(pending) {
            Ok(()) => return true,
            Err(TrySendError::Closed(_)) => {
                debug!("Output channel closed");
                return false;
            }
            Err(TrySendError::Full(back)) => {
                if ctx.stop.load(Ordering::Relaxed) {
                    return false;
                }
                pending = back;
                std::thread::sleep(PAUSE_SLICE);
            }
        }
    }
}

/// Sleep for `duration`, waking early when `stop` is raised.
fn pause(stop: &AtomicBool, duration: Duration) {
    let deadline = Instant::now() + duration;
    while !stop.load(Ordering::Relaxed) {
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        std::thread::sleep(PAUSE_SLICE.min(deadline - now));
    }
}
