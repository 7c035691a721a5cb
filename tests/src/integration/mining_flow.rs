//! # Mining Flow
//!
//! Candidate from graph tips → nonce search → graph insert → validator votes
//! → finalization → rewards.

use super::fixtures::{block, clock, key, node, transfer};
use node_runtime::adapters::GraphTips;
use node_runtime::genesis::{GenesisBuilder, GenesisConfig};
use shared_bus::{ConsensusEvent, EventFilter};
use shared_crypto::{sign_block, sign_vote};
use std::sync::Arc;
use std::time::Duration;
use tc_01_block_graph::BlockGraph;
use tc_02_pow_miner::{CandidateBuilder, MiningWorker, ProofOfWorkMiner, TransactionSource};
use tc_04_hybrid_consensus::{BlockStatus, ConsensusConfig, FinalizeOutcome, HybridConsensus};
use tokio::sync::mpsc;

#[test]
fn test_mined_block_finalizes_with_two_of_three_votes() {
    let time = clock();
    let graph = Arc::new(BlockGraph::new());
    let genesis = block(&[], 0, 0, [0u8; 32]);
    graph.add_block(genesis.clone()).unwrap();

    let miner_key = key(1);
    let builder = CandidateBuilder::new(Arc::new(GraphTips::new(graph.clone())), 4);
    let candidate = builder.build(vec![transfer(0), transfer(1)], 2, miner_key.identity());
    let miner = ProofOfWorkMiner::with_time_source(1_000, time.clone());
    let header = miner.search(&candidate.job(0), None).unwrap();
    let mined = candidate.into_block(header);

    assert!(mined.verify_pow() && mined.verify_merkle_root());
    assert_eq!(mined.parents(), &[genesis.hash]);
    assert_eq!(mined.height(), 1);
    assert!(graph.add_block(mined.clone()).unwrap());

    let consensus = HybridConsensus::new(ConsensusConfig::default()).with_time_source(time);
    let keys: Vec<_> = (10..13).map(key).collect();
    for (i, k) in keys.iter().enumerate() {
        consensus
            .register_validator(&format!("v{i}"), k.identity(), 1_000)
            .unwrap();
    }

    let first = consensus
        .validate_block(&mined, &sign_vote(&mined.hash, &keys[0]), "v0")
        .unwrap();
    assert!(!first.has_consensus);
    assert!(matches!(
        consensus.finalize_block(&mined.hash).unwrap(),
        FinalizeOutcome::Pending { .. }
    ));

    let second = consensus
        .validate_block(&mined, &sign_vote(&mined.hash, &keys[1]), "v1")
        .unwrap();
    assert!(second.has_consensus);

    let FinalizeOutcome::Finalized(finalization) = consensus.finalize_block(&mined.hash).unwrap() else {
        panic!("expected finalization");
    };
    assert_eq!(finalization.yes_voters, vec!["v0".to_string(), "v1".to_string()]);
    assert_eq!(consensus.block_status(&mined.hash), Some(BlockStatus::Finalized));

    let config = ConsensusConfig::default();
    assert_eq!(consensus.balance(&miner_key.identity()), config.miner_reward);
    assert_eq!(consensus.balance(&keys[0].identity()), config.vote_reward);
    assert_eq!(consensus.balance(&keys[2].identity()), 0);
    assert_eq!(consensus.validator("v0").unwrap().reputation.value(), 51);
    assert_eq!(consensus.validator("v2").unwrap().reputation.value(), 48);

    assert_eq!(graph.linearized_transactions(), vec![transfer(0), transfer(1)]);
}

#[test]
fn test_local_pipeline_drains_mempool_and_finalizes() {
    let node = node(3, clock());
    let genesis = GenesisBuilder::new(GenesisConfig::default())
        .ensure(&node.graph)
        .unwrap();
    let mut events = node.bus.subscribe(EventFilter::all());
    assert!(node.mempool.add(transfer(7)));

    let builder = CandidateBuilder::new(Arc::new(GraphTips::new(node.graph.clone())), 4);
    let candidate = builder.build(node.mempool.pending(10), 0, node.keypair.identity());
    let header = node.miner.search(&candidate.job(0), None).unwrap();
    let mut mined = candidate.into_block(header);
    sign_block(&mut mined, &node.keypair).unwrap();

    let report = node.ingestion.ingest(mined.clone()).unwrap();
    assert!(report.inserted && report.voted && report.finalized);
    assert!(node.mempool.is_empty());
    assert_eq!(node.graph.tips(10), vec![mined.hash]);
    assert!(node.graph.get(&genesis).is_some());

    let events = events.drain();
    assert!(events
        .iter()
        .any(|e| matches!(e, ConsensusEvent::BlockFinalized { hash, .. } if *hash == mined.hash)));
}

#[tokio::test]
async fn test_worker_threads_emit_blocks_until_shutdown() {
    let node = node(4, clock());
    GenesisBuilder::new(GenesisConfig::default())
        .ensure(&node.graph)
        .unwrap();

    let mut config = node.config.mining.clone();
    config.threads = 2;
    config.difficulty = 1;
    config.block_pause_ms = 5;
    let (tx, mut rx) = mpsc::channel(4);
    let builder = Arc::new(CandidateBuilder::new(
        Arc::new(GraphTips::new(node.graph.clone())),
        config.max_parents,
    ));
    let worker = MiningWorker::spawn(
        &config,
        node.miner.clone(),
        builder,
        node.mempool.clone(),
        node.keypair.identity(),
        tx,
    )
    .unwrap();
    assert_eq!(worker.thread_count(), 2);

    for _ in 0..2 {
        let mined = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(mined.block.verify_pow());
        assert_eq!(mined.block.height(), 1);
        assert!(mined.worker < 2);
    }

    tokio::task::spawn_blocking(move || worker.shutdown())
        .await
        .unwrap();
}
