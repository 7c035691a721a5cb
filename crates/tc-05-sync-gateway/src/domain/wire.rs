//! # Wire Records
//!
//! JSON bodies exchanged between an offline producer and a validating node.
//! Byte fields travel as lowercase hex. Neither record is persisted.

use crate::domain::errors::{RejectReason, SyncError};
use serde::{Deserialize, Serialize};
use shared_crypto::Ed25519KeyPair;
use shared_types::{hash_from_hex, hash_hex, Block, Hash, PublicKey, Signature};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    /// Canonical block bytes, signature field cleared.
    pub block_bytes: String,
    pub hash: String,
    #[serde(rename = "minerID")]
    pub miner_id: String,
    pub signature: String,
    pub timestamp: u64,
    pub difficulty: u32,
    pub nonce: u64,
}

impl SyncRequest {
    /// Serialize and sign `block` with the producer key.
    ///
    /// The block's miner id must be the key's public identity.
    pub fn signed(block: &Block, keypair: &Ed25519KeyPair) -> Result<Self, SyncError> {
        if block.header.miner_id != keypair.identity() {
            return Err(SyncError::ForeignBlock);
        }
        let bytes = block
            .signing_bytes()
            .map_err(|e| SyncError::Encoding(e.to_string()))?;
        let signature = keypair.sign(&bytes);

        Ok(Self {
            block_bytes: hex::encode(&bytes),
            hash: hash_hex(&block.hash),
            miner_id: hex::encode(block.header.miner_id),
            signature: hex::encode(signature.as_bytes()),
            timestamp: block.header.timestamp,
            difficulty: block.header.difficulty,
            nonce: block.header.nonce,
        })
    }

    pub fn to_json(&self) -> Result<Vec<u8>, SyncError> {
        serde_json::to_vec(self).map_err(|e| SyncError::Encoding(e.to_string()))
    }

    pub fn from_json(body: &[u8]) -> Result<Self, RejectReason> {
        serde_json::from_slice(body).map_err(|e| RejectReason::Malformed(e.to_string()))
    }

    /// Decode the hex fields.
    pub fn decode(&self) -> Result<DecodedRequest, RejectReason> {
        let block_bytes =
            hex::decode(&self.block_bytes).map_err(|e| malformed("blockBytes", e))?;
        let hash = hash_from_hex(&self.hash).map_err(|e| malformed("hash", e))?;
        let miner_id = hash_from_hex(&self.miner_id).map_err(|e| malformed("minerID", e))?;
        let signature: Signature = hex::decode(&self.signature)
            .map_err(|e| malformed("signature", e))?
            .try_into()
            .map_err(|v: Vec<u8>| {
                RejectReason::Malformed(format!("signature: expected 64 bytes, got {}", v.len()))
            })?;

        Ok(DecodedRequest {
            block_bytes,
            hash,
            miner_id,
            signature,
        })
    }
}

fn malformed(field: &str, e: impl std::fmt::Display) -> RejectReason {
    RejectReason::Malformed(format!("{field}: {e}"))
}

/// Binary form of the hex fields of a [`SyncRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRequest {
    pub block_bytes: Vec<u8>,
    pub hash: Hash,
    pub miner_id: PublicKey,
    pub signature: Signature,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SyncResponse {
    pub fn accepted(block_number: u64) -> Self {
        Self {
            accepted: true,
            block_number: Some(block_number),
            reason: None,
        }
    }

    pub fn rejected(reason: &RejectReason) -> Self {
        Self {
            accepted: false,
            block_number: None,
            reason: Some(reason.to_string()),
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, SyncError> {
        serde_json::to_vec(self).map_err(|e| SyncError::Encoding(e.to_string()))
    }

    pub fn from_json(body: &[u8]) -> Result<Self, SyncError> {
        serde_json::from_slice(body).map_err(|e| SyncError::MalformedResponse(e.to_string()))
    }
}
