//! # Block Ingestion
//!
//! Every full block, mined locally or delivered through the sync gateway,
//! runs the same pipeline:
//!
//! ```text
//! graph insert ──▶ fork detection ──▶ local vote ──▶ finalize attempt
//!      │                 │                 │               │
//!  BlockAdded      ForkDetected      BlockRejected   BlockFinalized
//! ```
//!
//! Components are called one after another and never while another
//! component's lock is held.

use crate::adapters::{LocalValidator, Mempool};
use crate::handlers::gossip::WantedBlocks;
use shared_bus::{ConsensusEvent, InMemoryEventBus};
use shared_types::{short_hex, Block, Hash};
use std::sync::Arc;
use tc_01_block_graph::{BlockGraph, GraphResult};
use tc_03_fork_resolution::ForkResolver;
use tc_04_hybrid_consensus::{ConsensusError, FinalizeOutcome, Finalization, HybridConsensus};
use tc_05_sync_gateway::BlockSink;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What the pipeline did with one block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// False when the block was already stored; nothing else ran.
    pub inserted: bool,
    /// Fork opened or joined at the block's height.
    pub fork: Option<Uuid>,
    /// The local validator recorded a yes-vote.
    pub voted: bool,
    /// Set when validation failed.
    pub rejected: Option<String>,
    pub finalized: bool,
}

pub struct BlockIngestion {
    graph: Arc<BlockGraph>,
    forks: Arc<ForkResolver>,
    consensus: Arc<HybridConsensus>,
    validator: Arc<LocalValidator>,
    mempool: Arc<Mempool>,
    wanted: Arc<WantedBlocks>,
    bus: Arc<InMemoryEventBus>,
}

impl BlockIngestion {
    pub fn new(
        graph: Arc<BlockGraph>,
        forks: Arc<ForkResolver>,
        consensus: Arc<HybridConsensus>,
        validator: Arc<LocalValidator>,
        mempool: Arc<Mempool>,
        wanted: Arc<WantedBlocks>,
        bus: Arc<InMemoryEventBus>,
    ) -> Self {
        Self {
            graph,
            forks,
            consensus,
            validator,
            mempool,
            wanted,
            bus,
        }
    }

    /// Run the pipeline for `block`. Only a graph store failure is an error.
    #[tracing::instrument(skip(self, block), fields(hash = %short_hex(&block.hash), height = block.height()))]
    pub fn ingest(&self, block: Block) -> GraphResult<IngestReport> {
        let hash = block.hash;
        let height = block.height();

        if !self.graph.add_block(block.clone())? {
            debug!("Block already in graph");
            return Ok(IngestReport::default());
        }
        let mut report = IngestReport {
            inserted: true,
            ..IngestReport::default()
        };
        self.wanted.fulfil(&hash);
        self.mempool.remove_included(&block.transactions);
        self.bus.emit(ConsensusEvent::BlockAdded {
            hash,
            height,
            miner: block.header.miner_id,
        });

        let same_height = self.graph.blocks_at_height(height);
        if same_height.len() > 1 {
            if let Some(fork) = self.forks.detect_fork(&block, &same_height) {
                info!(fork = %fork.id, chains = fork.chains.len(), "Height collision");
                self.bus.emit(ConsensusEvent::ForkDetected {
                    fork_id: fork.id,
                    height,
                    chain_count: fork.chains.len(),
                });
                report.fork = Some(fork.id);
            }
        }

        match self.validator.vote(&block) {
            Ok(receipt) => {
                debug!(yes_power = receipt.yes_power, active_power = receipt.active_power, "Local vote recorded");
                report.voted = true;
            }
            Err(ConsensusError::NotRegistered(_) | ConsensusError::Inactive(_)) => {
                debug!(validator = self.validator.id(), "Local node cannot vote");
            }
            Err(e) if e.is_structural() => {
                warn!(error = %e, "Block rejected");
                let reason = e.to_string();
                self.bus.emit(ConsensusEvent::BlockRejected {
                    hash,
                    reason: reason.clone(),
                });
                report.rejected = Some(reason);
                return Ok(report);
            }
            Err(e) => warn!(error = %e, "Local vote failed"),
        }

        report.finalized = self.try_finalize(&hash);
        Ok(report)
    }

    /// Attempt finalization and publish the outcome. Blocks nobody has
    /// voted on are not tracked by consensus yet.
    pub fn try_finalize(&self, hash: &Hash) -> bool {
        match self.consensus.finalize_block(hash) {
            Ok(FinalizeOutcome::Finalized(finalization)) => {
                publish_finalization(&self.bus, &finalization);
                true
            }
            Ok(FinalizeOutcome::Pending { yes_power, active_power }) => {
                debug!(block = %short_hex(hash), yes_power, active_power, "Awaiting quorum");
                false
            }
            Ok(FinalizeOutcome::AlreadyFinalized) | Err(ConsensusError::UnknownBlock(_)) => false,
            Err(e) => {
                warn!(block = %short_hex(hash), error = %e, "Finalization failed");
                false
            }
        }
    }
}

pub fn publish_finalization(bus: &InMemoryEventBus, finalization: &Finalization) {
    bus.emit(ConsensusEvent::BlockFinalized {
        hash: finalization.block,
        height: finalization.height,
        yes_votes: finalization.yes_voters.len(),
    });
}

impl BlockSink for BlockIngestion {
    fn contains(&self, hash: &Hash) -> bool {
        self.graph.contains(hash)
    }

    fn store(&self, block: Block) -> Result<bool, String> {
        self.ingest(block)
            .map(|report| report.inserted)
            .map_err(|e| e.to_string())
    }
}
