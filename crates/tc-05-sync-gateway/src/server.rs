//! # Sync Server
//!
//! Validating side of a submission. Checks run in a fixed order and the
//! first failure becomes the rejection reason:
//!
//! 1. decode
//! 2. request fields agree with the decoded header
//! 3. recomputed hash matches
//! 4. producer signature over the block bytes (miner id is the key)
//! 5. timestamp within skew of the server clock
//! 6. proof of work
//! 7. local block verification
//! 8. store

use crate::config::SyncConfig;
use crate::domain::{RejectReason, SyncRequest, SyncResponse};
use crate::ports::{BlockSink, BlockVerifier};
use shared_crypto::verify_block_signature;
use shared_types::{hash_hex, short_hex, Block, SystemTimeSource, TimeSource};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct SyncServer {
    verifier: Arc<dyn BlockVerifier>,
    sink: Arc<dyn BlockSink>,
    time: Arc<dyn TimeSource>,
    config: SyncConfig,
}

impl SyncServer {
    pub fn new(verifier: Arc<dyn BlockVerifier>, sink: Arc<dyn BlockSink>, config: SyncConfig) -> Self {
        Self {
            verifier,
            sink,
            time: Arc::new(SystemTimeSource),
            config,
        }
    }

    /// Set custom time source (for testing)
    pub fn with_time_source(mut self, time: Arc<dyn TimeSource>) -> Self {
        self.time = time;
        self
    }

    /// Handle a raw JSON body. Always produces a JSON reply.
    pub fn handle_bytes(&self, body: &[u8]) -> Vec<u8> {
        let response = match SyncRequest::from_json(body) {
            Ok(request) => self.handle(&request),
            Err(reason) => {
                warn!(%reason, "Sync request rejected");
                SyncResponse::rejected(&reason)
            }
        };
        // A response of a bool, a u64 and a string always encodes.
        response.to_json().unwrap_or_default()
    }

    pub fn handle(&self, request: &SyncRequest) -> SyncResponse {
        match self.admit(request) {
            Ok(height) => SyncResponse::accepted(height),
            Err(reason) => {
                warn!(hash = %request.hash, %reason, "Sync request rejected");
                SyncResponse::rejected(&reason)
            }
        }
    }

    /// Run every check and store the block; returns its height.
    fn admit(&self, request: &SyncRequest) -> Result<u64, RejectReason> {
        let decoded = request.decode()?;
        let mut block = Block::from_bytes(&decoded.block_bytes)
            .map_err(|e| RejectReason::Malformed(e.to_string()))?;

        let header = &block.header;
        if decoded.miner_id != header.miner_id {
            return Err(RejectReason::FieldMismatch("minerID"));
        }
        if request.timestamp != header.timestamp {
            return Err(RejectReason::FieldMismatch("timestamp"));
        }
        if request.difficulty != header.difficulty {
            return Err(RejectReason::FieldMismatch("difficulty"));
        }
        if request.nonce != header.nonce {
            return Err(RejectReason::FieldMismatch("nonce"));
        }

        let computed = header.hash();
        if computed != decoded.hash || computed != block.hash {
            return Err(RejectReason::HashMismatch {
                computed: hash_hex(&computed),
            });
        }

        verify_block_signature(&header.miner_id, &decoded.block_bytes, &decoded.signature)
            .map_err(|_| RejectReason::BadSignature)?;

        let now = self.time.now();
        let skew = now.abs_diff(header.timestamp);
        if skew > self.config.max_timestamp_skew_secs {
            return Err(RejectReason::TimestampSkew {
                timestamp: header.timestamp,
                skew,
            });
        }

        if !block.verify_pow() {
            return Err(RejectReason::InsufficientPoW(header.difficulty));
        }

        let height = block.height();
        if self.sink.contains(&block.hash) {
            debug!(hash = %short_hex(&block.hash), "Resubmitted block already stored");
            return Ok(height);
        }

        self.verifier.verify(&block).map_err(RejectReason::Validation)?;

        block.signature = Some(decoded.signature);
        let hash = block.hash;
        self.sink.store(block).map_err(RejectReason::Storage)?;
        info!(hash = %short_hex(&hash), height, "Remote block accepted");
        Ok(height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use shared_crypto::Ed25519KeyPair;
    use shared_types::{BlockHeader, FixedTimeSource, Hash, ZERO_HASH};

    const NOW: u64 = 1_700_000_000;

    #[derive(Default)]
    struct MemorySink(Mutex<Vec<Block>>);

    impl BlockSink for MemorySink {
        fn contains(&self, hash: &Hash) -> bool {
            self.0.lock().iter().any(|b| b.hash == *hash)
        }

        fn store(&self, block: Block) -> Result<bool, String> {
            if self.contains(&block.hash) {
                return Ok(false);
            }
            self.0.lock().push(block);
            Ok(true)
        }
    }

    struct AcceptAll;

    impl BlockVerifier for AcceptAll {
        fn verify(&self, _block: &Block) -> Result<(), String> {
            Ok(())
        }
    }

    struct RejectAll;

    impl BlockVerifier for RejectAll {
        fn verify(&self, _block: &Block) -> Result<(), String> {
            Err("validator inactive".into())
        }
    }

    fn producer() -> Ed25519KeyPair {
        Ed25519KeyPair::from_seed([8u8; 32])
    }

    fn block(timestamp: u64, difficulty: u32) -> Block {
        Block::seal(
            BlockHeader {
                parent_hashes: vec![[1u8; 32]],
                height: 12,
                merkle_root: ZERO_HASH,
                timestamp,
                difficulty,
                nonce: 0,
                miner_id: producer().identity(),
            },
            vec![],
        )
    }

    fn server(verifier: Arc<dyn BlockVerifier>) -> (SyncServer, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::default());
        let server = SyncServer::new(verifier, sink.clone(), SyncConfig::default())
            .with_time_source(Arc::new(FixedTimeSource::new(NOW)));
        (server, sink)
    }

    fn rejection(response: SyncResponse) -> String {
        assert!(!response.accepted);
        response.reason.unwrap_or_default()
    }

    #[test]
    fn test_accepts_and_stores_signed_block() {
        let (server, sink) = server(Arc::new(AcceptAll));
        let request = SyncRequest::signed(&block(NOW, 0), &producer()).unwrap();

        let response = server.handle(&request);
        assert_eq!(response, SyncResponse::accepted(12));

        let stored = sink.0.lock()[0].clone();
        assert!(stored.signature.is_some());
    }

    #[test]
    fn test_resubmission_is_idempotent() {
        let (server, sink) = server(Arc::new(AcceptAll));
        let request = SyncRequest::signed(&block(NOW, 0), &producer()).unwrap();

        assert!(server.handle(&request).accepted);
        assert!(server.handle(&request).accepted);
        assert_eq!(sink.0.lock().len(), 1);
    }

    #[test]
    fn test_corrupted_signature_rejected() {
        let (server, sink) = server(Arc::new(AcceptAll));
        let mut request = SyncRequest::signed(&block(NOW, 0), &producer()).unwrap();
        let mut sig = hex::decode(&request.signature).unwrap();
        sig[0] ^= 0xFF;
        request.signature = hex::encode(sig);

        assert!(rejection(server.handle(&request)).contains("signature"));
        assert!(sink.0.lock().is_empty());
    }

    #[test]
    fn test_field_mismatch_rejected() {
        let (server, _) = server(Arc::new(AcceptAll));
        let mut request = SyncRequest::signed(&block(NOW, 0), &producer()).unwrap();
        request.nonce = 99;

        assert!(rejection(server.handle(&request)).contains("nonce"));
    }

    #[test]
    fn test_wrong_hash_rejected() {
        let (server, _) = server(Arc::new(AcceptAll));
        let mut request = SyncRequest::signed(&block(NOW, 0), &producer()).unwrap();
        request.hash = hash_hex(&[7u8; 32]);

        assert!(rejection(server.handle(&request)).contains("hash mismatch"));
    }

    #[test]
    fn test_timestamp_skew_rejected() {
        let (server, _) = server(Arc::new(AcceptAll));
        let stale = NOW - SyncConfig::default().max_timestamp_skew_secs - 1;
        let request = SyncRequest::signed(&block(stale, 0), &producer()).unwrap();

        assert!(rejection(server.handle(&request)).contains("timestamp"));
    }

    #[test]
    fn test_insufficient_pow_rejected() {
        let (server, _) = server(Arc::new(AcceptAll));
        let request =
            SyncRequest::signed(&block(NOW, shared_types::MAX_DIFFICULTY), &producer()).unwrap();

        assert!(rejection(server.handle(&request)).contains("proof of work"));
    }

    #[test]
    fn test_verifier_rejection_carries_reason() {
        let (server, sink) = server(Arc::new(RejectAll));
        let request = SyncRequest::signed(&block(NOW, 0), &producer()).unwrap();

        assert!(rejection(server.handle(&request)).contains("validator inactive"));
        assert!(sink.0.lock().is_empty());
    }

    #[test]
    fn test_malformed_body_gets_json_rejection() {
        let (server, _) = server(Arc::new(AcceptAll));
        let reply = SyncResponse::from_json(&server.handle_bytes(b"{not json")).unwrap();

        assert!(rejection(reply).contains("malformed"));
    }
}
