//! # DAG Index
//!
//! Arena-style map keyed by hash. Holds no lock of its own; [`crate::BlockGraph`]
//! wraps it in one.
//!
//! Tips are tracked incrementally. `referenced` remembers every hash named as a
//! parent by a stored block, including parents that are not stored yet, so an
//! orphan's parent arriving later is correctly inserted as a non-tip.

use shared_types::{Block, Hash, Transaction};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Snapshot counters for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub blocks: usize,
    pub tips: usize,
    /// Stored blocks with at least one parent not stored locally.
    pub orphans: usize,
    pub max_height: Option<u64>,
}

#[derive(Debug, Default)]
pub struct DagIndex {
    blocks: HashMap<Hash, Block>,
    tips: HashSet<Hash>,
    referenced: HashSet<Hash>,
    by_height: BTreeMap<u64, Vec<Hash>>,
}

impl DagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a block. Returns `false` if the hash is already stored.
    pub fn insert(&mut self, block: Block) -> bool {
        let hash = block.hash;
        if self.blocks.contains_key(&hash) {
            return false;
        }

        for parent in block.parents() {
            self.referenced.insert(*parent);
            self.tips.remove(parent);
        }
        if !self.referenced.contains(&hash) {
            self.tips.insert(hash);
        }
        self.by_height.entry(block.height()).or_default().push(hash);
        self.blocks.insert(hash, block);
        true
    }

    pub fn get(&self, hash: &Hash) -> Option<&Block> {
        self.blocks.get(hash)
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.blocks.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Parent hashes recorded for a stored block.
    pub fn parents_of(&self, hash: &Hash) -> Option<&[Hash]> {
        self.blocks.get(hash).map(Block::parents)
    }

    pub fn is_tip(&self, hash: &Hash) -> bool {
        self.tips.contains(hash)
    }

    /// Up to `limit` tips, highest first, ties by hash.
    pub fn tips(&self, limit: usize) -> Vec<Hash> {
        let mut tips: Vec<(u64, Hash)> = self
            .tips
            .iter()
            .filter_map(|h| self.blocks.get(h).map(|b| (b.height(), *h)))
            .collect();
        tips.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        tips.into_iter().take(limit).map(|(_, h)| h).collect()
    }

    /// Hashes of stored blocks at `height`, in insertion order.
    pub fn blocks_at_height(&self, height: u64) -> Vec<Hash> {
        self.by_height.get(&height).cloned().unwrap_or_default()
    }

    /// The subset of `hashes` not stored locally, first occurrence order.
    pub fn missing(&self, hashes: &[Hash]) -> Vec<Hash> {
        let mut seen = HashSet::new();
        hashes
            .iter()
            .filter(|h| !self.blocks.contains_key(*h) && seen.insert(**h))
            .copied()
            .collect()
    }

    /// Kahn's algorithm over edges between stored blocks.
    ///
    /// Parents always precede children. Among blocks that are ready at the
    /// same time, lower height comes first, then lower hash.
    pub fn topological_order(&self) -> Vec<Hash> {
        let mut in_degree: HashMap<Hash, usize> = HashMap::with_capacity(self.blocks.len());
        let mut children: HashMap<Hash, Vec<Hash>> = HashMap::new();

        for (hash, block) in &self.blocks {
            let mut stored_parents: Vec<&Hash> = block
                .parents()
                .iter()
                .filter(|p| self.blocks.contains_key(*p))
                .collect();
            // A parent listed twice is still one edge.
            stored_parents.sort_unstable();
            stored_parents.dedup();

            in_degree.insert(*hash, stored_parents.len());
            for parent in stored_parents {
                children.entry(*parent).or_default().push(*hash);
            }
        }

        let mut ready: BTreeSet<(u64, Hash)> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .filter_map(|(h, _)| self.blocks.get(h).map(|b| (b.height(), *h)))
            .collect();

        let mut order = Vec::with_capacity(self.blocks.len());
        while let Some((_, hash)) = ready.pop_first() {
            order.push(hash);

            let Some(kids) = children.get(&hash) else {
                continue;
            };
            for child in kids {
                let Some(degree) = in_degree.get_mut(child) else {
                    continue;
                };
                *degree -= 1;
                if *degree == 0 {
                    if let Some(block) = self.blocks.get(child) {
                        ready.insert((block.height(), *child));
                    }
                }
            }
        }
        order
    }

    /// Transactions of every stored block in topological order, each
    /// distinct transaction hash kept once (first occurrence wins).
    pub fn linearized_transactions(&self) -> Vec<Transaction> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for hash in self.topological_order() {
            let Some(block) = self.blocks.get(&hash) else {
                continue;
            };
            for tx in &block.transactions {
                if seen.insert(tx.hash()) {
                    out.push(tx.clone());
                }
            }
        }
        out
    }

    pub fn stats(&self) -> GraphStats {
        let orphans = self
            .blocks
            .values()
            .filter(|b| b.parents().iter().any(|p| !self.blocks.contains_key(p)))
            .count();
        GraphStats {
            blocks: self.blocks.len(),
            tips: self.tips.len(),
            orphans,
            max_height: self.by_height.keys().next_back().copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::BlockHeader;

    fn block(parents: Vec<Hash>, height: u64, nonce: u64) -> Block {
        block_with_txs(parents, height, nonce, vec![])
    }

    fn block_with_txs(parents: Vec<Hash>, height: u64, nonce: u64, txs: Vec<Transaction>) -> Block {
        let tx_hashes: Vec<Hash> = txs.iter().map(Transaction::hash).collect();
        Block::seal(
            BlockHeader {
                parent_hashes: parents,
                height,
                merkle_root: shared_types::compute_merkle_root(&tx_hashes),
                timestamp: 1_700_000_000 + height,
                difficulty: 0,
                nonce,
                miner_id: [1u8; 32],
            },
            txs,
        )
    }

    fn tip_set(dag: &DagIndex) -> HashSet<Hash> {
        dag.tips(usize::MAX).into_iter().collect()
    }

    #[test]
    fn test_tip_invariant_linear() {
        let mut dag = DagIndex::new();
        let g = block(vec![], 0, 0);
        let b = block(vec![g.hash], 1, 0);

        dag.insert(g.clone());
        assert_eq!(tip_set(&dag), HashSet::from([g.hash]));

        dag.insert(b.clone());
        assert_eq!(tip_set(&dag), HashSet::from([b.hash]));
    }

    #[test]
    fn test_idempotent_insert() {
        let mut dag = DagIndex::new();
        let g = block(vec![], 0, 0);

        assert!(dag.insert(g.clone()));
        assert!(!dag.insert(g));
        assert_eq!(dag.len(), 1);
    }

    #[test]
    fn test_orphan_parent_arriving_late_is_not_tip() {
        let mut dag = DagIndex::new();
        let g = block(vec![], 0, 0);
        let child = block(vec![g.hash], 1, 0);

        dag.insert(child.clone());
        assert_eq!(tip_set(&dag), HashSet::from([child.hash]));
        assert_eq!(dag.stats().orphans, 1);

        dag.insert(g.clone());
        assert!(!dag.is_tip(&g.hash));
        assert_eq!(tip_set(&dag), HashSet::from([child.hash]));
        assert_eq!(dag.stats().orphans, 0);
    }

    #[test]
    fn test_multi_parent_merge_clears_both_tips() {
        let mut dag = DagIndex::new();
        let g = block(vec![], 0, 0);
        let a = block(vec![g.hash], 1, 1);
        let b = block(vec![g.hash], 1, 2);
        let m = block(vec![a.hash, b.hash], 2, 0);

        for blk in [g, a.clone(), b.clone()] {
            dag.insert(blk);
        }
        assert_eq!(tip_set(&dag), HashSet::from([a.hash, b.hash]));

        dag.insert(m.clone());
        assert_eq!(tip_set(&dag), HashSet::from([m.hash]));
    }

    #[test]
    fn test_tips_limit_prefers_height() {
        let mut dag = DagIndex::new();
        let g = block(vec![], 0, 0);
        let a = block(vec![g.hash], 1, 1);
        let orphan_high = block(vec![[9u8; 32]], 7, 0);
        dag.insert(g);
        dag.insert(a);
        dag.insert(orphan_high.clone());

        assert_eq!(dag.tips(1), vec![orphan_high.hash]);
        assert_eq!(dag.tips(10).len(), 2);
    }

    #[test]
    fn test_missing_is_set_difference() {
        let mut dag = DagIndex::new();
        let g = block(vec![], 0, 0);
        dag.insert(g.clone());

        let unknown = [7u8; 32];
        assert_eq!(dag.missing(&[g.hash, unknown, unknown]), vec![unknown]);
        assert!(dag.missing(&[]).is_empty());
    }

    #[test]
    fn test_topological_order_parents_first() {
        let mut dag = DagIndex::new();
        let g = block(vec![], 0, 0);
        let a = block(vec![g.hash], 1, 1);
        let b = block(vec![g.hash], 1, 2);
        let m = block(vec![b.hash, a.hash], 2, 0);

        // Insert out of order.
        for blk in [m.clone(), b.clone(), g.clone(), a.clone()] {
            dag.insert(blk);
        }

        let order = dag.topological_order();
        let pos = |h: &Hash| order.iter().position(|x| x == h).unwrap();
        assert_eq!(order.len(), 4);
        assert_eq!(order[0], g.hash);
        assert!(pos(&a.hash) < pos(&m.hash));
        assert!(pos(&b.hash) < pos(&m.hash));
        assert_eq!(order[3], m.hash);
    }

    #[test]
    fn test_topological_order_is_deterministic() {
        let g = block(vec![], 0, 0);
        let a = block(vec![g.hash], 1, 1);
        let b = block(vec![g.hash], 1, 2);

        let mut first = DagIndex::new();
        let mut second = DagIndex::new();
        for blk in [g.clone(), a.clone(), b.clone()] {
            first.insert(blk);
        }
        for blk in [b, a, g] {
            second.insert(blk);
        }
        assert_eq!(first.topological_order(), second.topological_order());
    }

    #[test]
    fn test_linearized_transactions_deduplicate() {
        let shared = shared_types::Transaction::transfer([1; 32], [2; 32], 10, 1, 0);
        let only_b = shared_types::Transaction::transfer([3; 32], [4; 32], 5, 1, 0);

        let mut dag = DagIndex::new();
        let g = block(vec![], 0, 0);
        let a = block_with_txs(vec![g.hash], 1, 1, vec![shared.clone()]);
        let b = block_with_txs(vec![g.hash], 1, 2, vec![shared.clone(), only_b.clone()]);
        for blk in [g, a, b] {
            dag.insert(blk);
        }

        let txs = dag.linearized_transactions();
        assert_eq!(txs.len(), 2);
        assert!(txs.contains(&shared));
        assert!(txs.contains(&only_b));
    }

    #[test]
    fn test_blocks_at_height_and_stats() {
        let mut dag = DagIndex::new();
        let g = block(vec![], 0, 0);
        let a = block(vec![g.hash], 1, 1);
        let b = block(vec![g.hash], 1, 2);
        for blk in [g, a.clone(), b.clone()] {
            dag.insert(blk);
        }

        assert_eq!(dag.blocks_at_height(1), vec![a.hash, b.hash]);
        assert!(dag.blocks_at_height(9).is_empty());

        let stats = dag.stats();
        assert_eq!(stats.blocks, 3);
        assert_eq!(stats.tips, 2);
        assert_eq!(stats.max_height, Some(1));
    }
}
