//! # Consensus Flow
//!
//! Equivocation evidence → slash sweep → quorum recomputed over the
//! remaining active power → re-activation by top-up.

use super::fixtures::{block, clock, key};
use node_runtime::handlers::{punish_equivocations, sweep_finalizations};
use shared_bus::{ConsensusEvent, EventFilter, EventTopic, InMemoryEventBus};
use shared_crypto::{sign_vote, Ed25519KeyPair};
use std::sync::Arc;
use tc_04_hybrid_consensus::{ConsensusConfig, ConsensusError, HybridConsensus};

fn validators(consensus: &HybridConsensus) -> Vec<Ed25519KeyPair> {
    (0..3u8)
        .map(|i| {
            let k = key(30 + i);
            consensus
                .register_validator(&format!("v{i}"), k.identity(), 1_000)
                .unwrap();
            k
        })
        .collect()
}

#[test]
fn test_equivocator_is_slashed_and_excluded_from_quorum() {
    let consensus = Arc::new(HybridConsensus::new(ConsensusConfig::default()).with_time_source(clock()));
    let bus = InMemoryEventBus::new();
    let mut slashes = bus.subscribe(EventFilter::topics(vec![EventTopic::Validators]));
    let keys = validators(&consensus);
    let target = block(&[], 1, 1, [7u8; 32]);

    consensus
        .validate_block(&target, &sign_vote(&target.hash, &keys[0]), "v0")
        .unwrap();
    assert!(matches!(
        consensus.reject_block(&target, "v0"),
        Err(ConsensusError::ConflictingVote { .. })
    ));

    assert_eq!(punish_equivocations(&consensus, &bus), 1);
    let v0 = consensus.validator("v0").unwrap();
    assert_eq!(v0.stake, 900);
    assert!(!v0.is_active);
    assert_eq!(v0.reputation.value(), 25);
    assert!(matches!(
        slashes.drain().as_slice(),
        [ConsensusEvent::ValidatorSlashed { deactivated: true, penalty: 100, .. }]
    ));

    // v0's earlier yes no longer counts; quorum is over v1 + v2 only.
    let receipt = consensus
        .validate_block(&target, &sign_vote(&target.hash, &keys[1]), "v1")
        .unwrap();
    assert_eq!(receipt.active_power, 20);
    assert_eq!(receipt.yes_power, 10);
    assert!(!receipt.has_consensus);
    assert_eq!(sweep_finalizations(&consensus, &bus), 0);

    assert!(matches!(
        consensus.validate_block(&target, &sign_vote(&target.hash, &keys[0]), "v0"),
        Err(ConsensusError::Inactive(_))
    ));

    let receipt = consensus
        .validate_block(&target, &sign_vote(&target.hash, &keys[2]), "v2")
        .unwrap();
    assert!(receipt.has_consensus);
    assert_eq!(sweep_finalizations(&consensus, &bus), 1);

    // Inactive validators are neither paid nor penalized.
    assert_eq!(consensus.balance(&keys[0].identity()), 0);
    assert_eq!(consensus.validator("v0").unwrap().reputation.value(), 25);

    let v0 = consensus.add_stake("v0", 100).unwrap();
    assert!(v0.is_active);
    assert_eq!(consensus.active_power(), 30);
}

#[test]
fn test_evidence_is_drained_once() {
    let consensus = HybridConsensus::new(ConsensusConfig::default()).with_time_source(clock());
    let bus = InMemoryEventBus::new();
    let keys = validators(&consensus);
    let target = block(&[], 1, 2, [7u8; 32]);

    consensus
        .validate_block(&target, &sign_vote(&target.hash, &keys[1]), "v1")
        .unwrap();
    // Flipping again and again is still one equivocation.
    for _ in 0..3 {
        assert!(consensus.reject_block(&target, "v1").is_err());
    }

    assert_eq!(punish_equivocations(&consensus, &bus), 1);
    assert_eq!(punish_equivocations(&consensus, &bus), 0);
    assert_eq!(consensus.validator("v1").unwrap().slash_count, 1);
}
