//! # Gossip Flow
//!
//! Announcements mark unknown blocks as wanted, duplicates are dropped at
//! the boundary, and announced transactions travel mempool → candidate →
//! graph.

use super::fixtures::{clock, key, node, transfer, NOW};
use node_runtime::adapters::GraphTips;
use node_runtime::genesis::{GenesisBuilder, GenesisConfig};
use node_runtime::handlers::{GossipHandler, GossipOutcome};
use shared_bus::GossipMessage;
use shared_crypto::sign_block;
use std::sync::Arc;
use tc_02_pow_miner::{CandidateBuilder, TransactionSource};
use tc_05_sync_gateway::{InProcessTransport, SyncClient, SyncConfig};
use uuid::Uuid;

#[tokio::test]
async fn test_announced_block_wanted_until_delivered() {
    let node = node(50, clock());
    let genesis = GenesisBuilder::new(GenesisConfig::default()).ensure(&node.graph).unwrap();
    let gossip = GossipHandler::new(
        String::from("node-50"),
        node.graph.clone(),
        node.mempool.clone(),
        node.wanted.clone(),
        Arc::clone(&node.time),
    );

    // A peer mined a block we have not seen.
    let producer = key(51);
    let builder = CandidateBuilder::new(Arc::new(GraphTips::new(node.graph.clone())), 4);
    let candidate = builder.build(vec![], 0, producer.identity());
    let header = node.miner.search(&candidate.job(0), None).unwrap();
    let remote = candidate.into_block(header);
    assert_eq!(remote.parents(), &[genesis]);

    let raw = GossipMessage::NewBlock { hash: remote.hash, height: 1 }
        .encode(Uuid::new_v4(), NOW)
        .unwrap();
    assert_eq!(gossip.handle(&raw).unwrap(), GossipOutcome::BlockWanted(remote.hash));
    assert!(gossip.handle(&raw).unwrap_err().is_duplicate());
    assert_eq!(node.wanted.snapshot(), vec![remote.hash]);

    let client = SyncClient::new(
        Arc::new(InProcessTransport::new(node.sync_server.clone())),
        producer,
        SyncConfig::default(),
    );
    assert!(client.submit(&remote).await.unwrap().accepted());
    assert!(node.wanted.is_empty());

    // Announcing a known block is a no-op.
    let again = GossipMessage::NewBlock { hash: remote.hash, height: 1 }
        .encode(Uuid::new_v4(), NOW)
        .unwrap();
    assert_eq!(gossip.handle(&again).unwrap(), GossipOutcome::BlockKnown(remote.hash));
}

#[test]
fn test_announced_transaction_reaches_the_graph() {
    let node = node(52, clock());
    GenesisBuilder::new(GenesisConfig::default()).ensure(&node.graph).unwrap();
    let gossip = GossipHandler::new(
        String::from("node-52"),
        node.graph.clone(),
        node.mempool.clone(),
        node.wanted.clone(),
        Arc::clone(&node.time),
    );

    let tx = transfer(9);
    let raw = GossipMessage::NewTransaction(tx.clone())
        .encode(Uuid::new_v4(), NOW)
        .unwrap();
    assert_eq!(gossip.handle(&raw).unwrap(), GossipOutcome::TransactionQueued(tx.hash()));
    assert!(node.mempool.contains(&tx.hash()));

    let builder = CandidateBuilder::new(Arc::new(GraphTips::new(node.graph.clone())), 4);
    let candidate = builder.build(node.mempool.pending(100), 0, node.keypair.identity());
    assert_eq!(candidate.transactions, vec![tx.clone()]);
    let header = node.miner.search(&candidate.job(0), None).unwrap();
    let mut mined = candidate.into_block(header);
    sign_block(&mut mined, &node.keypair).unwrap();

    assert!(node.ingestion.ingest(mined).unwrap().inserted);
    assert!(node.mempool.is_empty());
    assert_eq!(node.graph.linearized_transactions(), vec![tx]);
}

#[test]
fn test_peer_heartbeats_tracked() {
    let node = node(53, clock());
    let gossip = GossipHandler::new(
        String::from("node-53"),
        node.graph.clone(),
        node.mempool.clone(),
        node.wanted.clone(),
        Arc::clone(&node.time),
    );

    for (peer, height) in [("node-1", 4), ("node-2", 9)] {
        let raw = GossipMessage::Heartbeat { node_id: peer.into(), best_height: height }
            .encode(Uuid::new_v4(), NOW)
            .unwrap();
        gossip.process(&raw);
    }
    let own = GossipMessage::Heartbeat { node_id: "node-53".into(), best_height: 99 }
        .encode(Uuid::new_v4(), NOW)
        .unwrap();
    assert_eq!(gossip.handle(&own).unwrap(), GossipOutcome::OwnMessage);
    assert_eq!(gossip.best_peer_height(), Some(9));
}
