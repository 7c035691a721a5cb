//! # Mempool
//!
//! FIFO queue of announced transactions waiting for a block. A transaction
//! leaves the pool once a block carrying it enters the graph.

use parking_lot::Mutex;
use shared_types::{short_hex, Hash, Transaction};
use std::collections::{HashSet, VecDeque};
use tc_02_pow_miner::TransactionSource;
use tracing::debug;

#[derive(Debug, Default)]
struct PoolState {
    queue: VecDeque<Transaction>,
    index: HashSet<Hash>,
}

pub struct Mempool {
    state: Mutex<PoolState>,
    capacity: usize,
}

impl Mempool {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(PoolState::default()),
            capacity,
        }
    }

    /// Queue a transaction. Returns false for unsound or known transactions,
    /// or when the pool is full.
    pub fn add(&self, tx: Transaction) -> bool {
        if !tx.is_structurally_sound() {
            debug!(tx = %short_hex(&tx.hash()), "Dropping unsound transaction");
            return false;
        }
        let hash = tx.hash();
        let mut state = self.state.lock();
        if state.queue.len() >= self.capacity || !state.index.insert(hash) {
            return false;
        }
        state.queue.push_back(tx);
        true
    }

    /// Drop every transaction in `included`. Returns how many were pooled.
    pub fn remove_included(&self, included: &[Transaction]) -> usize {
        if included.is_empty() {
            return 0;
        }
        let hashes: HashSet<Hash> = included.iter().map(Transaction::hash).collect();
        let mut state = self.state.lock();
        let before = state.queue.len();
        state.queue.retain(|tx| !hashes.contains(&tx.hash()));
        state.index.retain(|h| !hashes.contains(h));
        before - state.queue.len()
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.state.lock().index.contains(hash)
    }

    pub fn len(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TransactionSource for Mempool {
    fn pending(&self, max: usize) -> Vec<Transaction> {
        self.state.lock().queue.iter().take(max).cloned().collect()
    }
}
