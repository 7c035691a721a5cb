//! # Sync Flow
//!
//! Producer client → transport → validating node, including retries on
//! transport failure and every server-side rejection path that matters.

use super::fixtures::{block_with, clock, key, node, transfer, NOW};
use async_trait::async_trait;
use node_runtime::genesis::{GenesisBuilder, GenesisConfig};
use shared_types::{compute_merkle_root, Block, BlockHeader, Hash};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tc_05_sync_gateway::{
    InProcessTransport, SyncClient, SyncConfig, SyncError, SyncRequest, SyncServer, SyncTransport,
    TransportError,
};

fn fast_retries() -> SyncConfig {
    SyncConfig {
        retry_delay_ms: 1,
        ..SyncConfig::default()
    }
}

/// Drops the first `failures` sends, then forwards to the server.
struct FlakyTransport {
    inner: InProcessTransport,
    failures: u32,
    sends: AtomicU32,
}

#[async_trait]
impl SyncTransport for FlakyTransport {
    async fn send(&self, body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        if self.sends.fetch_add(1, Ordering::SeqCst) < self.failures {
            return Err(TransportError::ConnectionFailed("connection reset".into()));
        }
        self.inner.send(body).await
    }
}

fn flaky(server: Arc<SyncServer>, failures: u32) -> Arc<FlakyTransport> {
    Arc::new(FlakyTransport {
        inner: InProcessTransport::new(server),
        failures,
        sends: AtomicU32::new(0),
    })
}

fn produced(parent: Hash, producer: u8, timestamp: u64) -> Block {
    let txs = vec![transfer(1)];
    let hashes: Vec<Hash> = txs.iter().map(|t| t.hash()).collect();
    Block::seal(
        BlockHeader {
            parent_hashes: vec![parent],
            height: 1,
            merkle_root: compute_merkle_root(&hashes),
            timestamp,
            difficulty: 0,
            nonce: 0,
            miner_id: key(producer).identity(),
        },
        txs,
    )
}

#[tokio::test]
async fn test_submitted_block_is_stored_and_finalized() {
    let node = node(40, clock());
    let genesis = GenesisBuilder::new(GenesisConfig::default()).ensure(&node.graph).unwrap();
    let block = produced(genesis, 41, NOW);

    let transport = Arc::new(InProcessTransport::new(node.sync_server.clone()));
    let client = SyncClient::new(transport, key(41), fast_retries());
    let submission = client.submit(&block).await.unwrap();

    assert!(submission.accepted());
    assert_eq!(submission.attempts, 1);
    assert_eq!(submission.response.block_number, Some(1));
    assert!(node.graph.contains(&block.hash));
    assert!(node.consensus.has_consensus(&block.hash));

    // Resubmission is idempotent.
    let again = client.submit(&block).await.unwrap();
    assert!(again.accepted());
    assert_eq!(node.graph.len(), 2);
}

#[tokio::test]
async fn test_bad_signature_rejected_without_retry() {
    let node = node(42, clock());
    let genesis = GenesisBuilder::new(GenesisConfig::default()).ensure(&node.graph).unwrap();
    let block = produced(genesis, 43, NOW);

    let mut request = SyncRequest::signed(&block, &key(43)).unwrap();
    let flipped = if request.signature.starts_with('0') { "1" } else { "0" };
    request.signature.replace_range(0..1, flipped);

    let transport = Arc::new(InProcessTransport::new(node.sync_server.clone()));
    let client = SyncClient::new(transport, key(43), fast_retries());
    let submission = client.submit_request(&request).await.unwrap();

    assert!(!submission.accepted());
    assert_eq!(submission.attempts, 1);
    assert!(submission.response.reason.unwrap().contains("signature"));
    assert!(!node.graph.contains(&block.hash));
}

#[tokio::test]
async fn test_stale_timestamp_rejected() {
    let node = node(44, clock());
    let genesis = GenesisBuilder::new(GenesisConfig::default()).ensure(&node.graph).unwrap();
    let block = produced(genesis, 45, NOW - 7_201);

    let transport = Arc::new(InProcessTransport::new(node.sync_server.clone()));
    let client = SyncClient::new(transport, key(45), fast_retries());
    let submission = client.submit(&block).await.unwrap();

    assert!(!submission.accepted());
    assert!(submission.response.reason.unwrap().contains("timestamp"));
}

#[tokio::test]
async fn test_transport_failures_are_retried() {
    let node = node(46, clock());
    let genesis = GenesisBuilder::new(GenesisConfig::default()).ensure(&node.graph).unwrap();
    let block = produced(genesis, 47, NOW);

    let client = SyncClient::new(flaky(node.sync_server.clone(), 2), key(47), fast_retries());
    let submission = client.submit(&block).await.unwrap();

    assert!(submission.accepted());
    assert_eq!(submission.attempts, 3);
    assert!(node.graph.contains(&block.hash));
}

#[tokio::test]
async fn test_delivery_fails_after_max_attempts() {
    let node = node(48, clock());
    let block = block_with(&[[1u8; 32]], 1, 0, key(49).identity(), vec![]);

    let transport = flaky(node.sync_server.clone(), u32::MAX);
    let client = SyncClient::new(transport.clone(), key(49), fast_retries());
    let err = client.submit(&block).await.unwrap_err();

    assert!(err.is_retryable());
    assert!(matches!(
        err,
        SyncError::DeliveryFailed { attempts: 3, last_error: TransportError::ConnectionFailed(_) }
    ));
    assert_eq!(transport.sends.load(Ordering::SeqCst), 3);
}
