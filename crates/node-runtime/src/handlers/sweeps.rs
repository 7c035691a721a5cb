//! # Periodic Sweeps
//!
//! One pass of each scheduled task. The loops in [`crate::wiring`] only
//! decide when a pass runs.

use crate::handlers::ingestion::publish_finalization;
use shared_bus::{ConsensusEvent, InMemoryEventBus};
use shared_types::short_hex;
use tc_03_fork_resolution::ForkResolver;
use tc_04_hybrid_consensus::HybridConsensus;
use tracing::{info, warn};

/// Resolve forks past their grace period and forget old resolved ones.
/// Returns how many forks were resolved.
pub fn sweep_forks(forks: &ForkResolver, bus: &InMemoryEventBus, prune_after_secs: u64) -> usize {
    let resolved = forks.resolve_expired();
    for fork in &resolved {
        let (Some(winning_chain), Some(rule)) = (&fork.winning_chain, fork.resolution_rule) else {
            continue;
        };
        bus.emit(ConsensusEvent::ForkResolved {
            fork_id: fork.id,
            height: fork.height,
            winning_chain: winning_chain.clone(),
            rule: rule.to_string(),
            tie_broken: fork.tie_broken,
        });
    }

    let pruned = forks.prune_resolved(prune_after_secs);
    if !resolved.is_empty() || pruned > 0 {
        info!(resolved = resolved.len(), pruned, "Fork sweep");
    }
    resolved.len()
}

/// Finalize every pending block that has reached quorum.
pub fn sweep_finalizations(consensus: &HybridConsensus, bus: &InMemoryEventBus) -> usize {
    let finalized = consensus.finalize_pending();
    for finalization in &finalized {
        publish_finalization(bus, finalization);
    }
    finalized.len()
}

/// Slash every validator caught voting both ways on a block.
pub fn punish_equivocations(consensus: &HybridConsensus, bus: &InMemoryEventBus) -> usize {
    let mut slashed = 0;
    for evidence in consensus.drain_evidence() {
        let reason = format!("conflicting votes on block {}", short_hex(&evidence.block));
        match consensus.slash_validator(&evidence.validator, &reason) {
            Ok(outcome) => {
                bus.emit(ConsensusEvent::ValidatorSlashed {
                    validator: outcome.validator,
                    reason,
                    penalty: outcome.penalty,
                    deactivated: outcome.deactivated,
                });
                slashed += 1;
            }
            Err(e) => warn!(validator = %evidence.validator, error = %e, "Slash failed"),
        }
    }
    slashed
}
