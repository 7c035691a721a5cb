//! # Fork Flow
//!
//! Height collision in the graph → chain rebuild → election, both directly
//! and through the node's ingestion pipeline and fork sweep.

use super::fixtures::{block, clock, node};
use node_runtime::genesis::{GenesisBuilder, GenesisConfig};
use node_runtime::handlers::sweep_forks;
use shared_bus::{ConsensusEvent, EventFilter, EventTopic};
use shared_types::hash_hex;
use std::sync::Arc;
use tc_01_block_graph::BlockGraph;
use tc_03_fork_resolution::{ForkChoiceConfig, ForkError, ForkResolver, ForkStatus, ResolutionRule};

#[test]
fn test_stake_backed_branch_wins() {
    let time = clock();
    let graph = Arc::new(BlockGraph::new());
    let resolver = ForkResolver::with_time_source(graph.clone(), ForkChoiceConfig::default(), time);

    let genesis = block(&[], 0, 0, [0u8; 32]);
    let staked = block(&[genesis.hash], 1, 1, [1u8; 32]).with_stake(10_000);
    let plain = block(&[genesis.hash], 1, 2, [2u8; 32]);
    for b in [&genesis, &staked, &plain] {
        graph.add_block(b.clone()).unwrap();
    }

    let fork = resolver
        .detect_fork(&plain, &graph.blocks_at_height(1))
        .unwrap();
    assert_eq!(fork.chains.len(), 2);
    assert!(fork.chains.iter().all(|c| c.blocks.len() == 1));

    let winner = resolver.resolve_fork(fork.id).unwrap();
    assert_eq!(winner.id, hash_hex(&staked.hash));

    let resolved = resolver.fork(fork.id).unwrap();
    assert_eq!(resolved.status, ForkStatus::Resolved);
    assert_eq!(resolved.resolution_rule, Some(ResolutionRule::Stake));
    assert!(!resolved.tie_broken);
    assert_eq!(
        resolver.resolve_fork(fork.id),
        Err(ForkError::AlreadyResolved(fork.id))
    );
}

#[test]
fn test_deep_branches_rebuilt_from_fork_point() {
    let graph = Arc::new(BlockGraph::new());
    let resolver = ForkResolver::with_time_source(graph.clone(), ForkChoiceConfig::default(), clock());

    let genesis = block(&[], 0, 0, [0u8; 32]);
    let a1 = block(&[genesis.hash], 1, 1, [1u8; 32]);
    let a2 = block(&[a1.hash], 2, 2, [1u8; 32]);
    let b1 = block(&[genesis.hash], 1, 3, [2u8; 32]);
    let b2 = block(&[b1.hash], 2, 4, [2u8; 32]);
    for b in [&genesis, &a1, &a2, &b1, &b2] {
        graph.add_block(b.clone()).unwrap();
    }

    let fork = resolver.detect_fork(&b2, &graph.blocks_at_height(2)).unwrap();
    let branch_a = fork.chains.iter().find(|c| c.id == hash_hex(&a2.hash)).unwrap();
    let branch_b = fork.chains.iter().find(|c| c.id == hash_hex(&b2.hash)).unwrap();
    assert_eq!(branch_a.blocks, vec![a1.hash, a2.hash]);
    assert_eq!(branch_b.blocks, vec![b1.hash, b2.hash]);

    // Identical scores: the lowest chain id wins.
    resolver.resolve_fork(fork.id).unwrap();
    let resolved = resolver.fork(fork.id).unwrap();
    assert!(resolved.tie_broken);
    let lowest = std::cmp::min(hash_hex(&a2.hash), hash_hex(&b2.hash));
    assert_eq!(resolved.winning_chain, Some(lowest));
}

#[test]
fn test_pipeline_detects_and_sweep_resolves() {
    let time = clock();
    let node = node(5, time.clone());
    let genesis = GenesisBuilder::new(GenesisConfig::default())
        .ensure(&node.graph)
        .unwrap();
    let mut forks = node.bus.subscribe(EventFilter::topics(vec![EventTopic::Forks]));

    node.ingestion.ingest(block(&[genesis], 1, 1, [1u8; 32])).unwrap();
    let report = node.ingestion.ingest(block(&[genesis], 1, 2, [2u8; 32])).unwrap();
    let fork_id = report.fork.unwrap();

    let third = node.ingestion.ingest(block(&[genesis], 1, 3, [3u8; 32])).unwrap();
    assert_eq!(third.fork, Some(fork_id));
    assert_eq!(node.forks.fork(fork_id).unwrap().chains.len(), 3);

    assert_eq!(sweep_forks(&node.forks, &node.bus, 3_600), 0);
    time.advance(node.config.fork_choice.resolution_grace_secs);
    assert_eq!(sweep_forks(&node.forks, &node.bus, 3_600), 1);

    let events = forks.drain();
    assert!(matches!(events[0], ConsensusEvent::ForkDetected { chain_count: 2, .. }));
    assert!(matches!(events[1], ConsensusEvent::ForkDetected { chain_count: 3, .. }));
    assert!(matches!(
        &events[2],
        ConsensusEvent::ForkResolved { fork_id: id, .. } if *id == fork_id
    ));
}

fn elect_winner(first: &shared_types::Block, second: &shared_types::Block) -> String {
    let graph = Arc::new(BlockGraph::new());
    let resolver = ForkResolver::with_time_source(graph.clone(), ForkChoiceConfig::default(), clock());
    let genesis = block(&[], 0, 0, [0u8; 32]);
    for b in [&genesis, first, second] {
        graph.add_block(b.clone()).unwrap();
    }
    let fork = resolver.detect_fork(second, &graph.blocks_at_height(1)).unwrap();
    resolver.resolve_fork(fork.id).unwrap().id
}

proptest::proptest! {
    #[test]
    fn test_winner_independent_of_arrival_order(stake_a in 0u128..20_000, stake_b in 0u128..20_000) {
        let genesis = block(&[], 0, 0, [0u8; 32]);
        let a = block(&[genesis.hash], 1, 1, [1u8; 32]).with_stake(stake_a);
        let b = block(&[genesis.hash], 1, 2, [2u8; 32]).with_stake(stake_b);

        let forward = elect_winner(&a, &b);
        proptest::prop_assert_eq!(&forward, &elect_winner(&b, &a));
        if stake_a.min(10_000) > stake_b.min(10_000) {
            proptest::prop_assert_eq!(forward, hash_hex(&a.hash));
        }
    }
}
