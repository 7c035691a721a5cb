//! Block graph adapter for candidate building.

use shared_types::Hash;
use std::sync::Arc;
use tc_01_block_graph::BlockGraph;
use tc_02_pow_miner::TipSource;

pub struct GraphTips {
    graph: Arc<BlockGraph>,
}

impl GraphTips {
    pub fn new(graph: Arc<BlockGraph>) -> Self {
        Self { graph }
    }
}

impl TipSource for GraphTips {
    fn tips(&self, limit: usize) -> Vec<Hash> {
        self.graph.tips(limit)
    }

    fn height_of(&self, hash: &Hash) -> Option<u64> {
        self.graph.height_of(hash)
    }
}
