//! # Outbound Ports
//!
//! What the miner needs from the host. The node runtime adapts the block
//! graph and its transaction queue to these traits.

use shared_types::{Hash, Transaction};

/// Read-only view of the graph's open tips.
pub trait TipSource: Send + Sync {
    /// Up to `limit` tips, highest first.
    fn tips(&self, limit: usize) -> Vec<Hash>;

    /// Height of a stored block.
    fn height_of(&self, hash: &Hash) -> Option<u64>;
}

/// Supplier of transactions for new candidates.
pub trait TransactionSource: Send + Sync {
    /// Up to `max` transactions to include.
    fn pending(&self, max: usize) -> Vec<Transaction>;
}

/// A source with nothing to offer; candidates carry no transactions.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTransactions;

impl TransactionSource for NoTransactions {
    fn pending(&self, _max: usize) -> Vec<Transaction> {
        Vec::new()
    }
}
