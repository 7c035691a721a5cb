//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Chain**: `Block`, `BlockHeader`, `Transaction`
//! - **Identity**: `PublicKey`, `Signature`, `Address`

use crate::errors::CodecError;
use crate::hashing::{block_hash, compute_merkle_root, meets_difficulty, sha256};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

/// A 32-byte SHA-256 hash.
pub type Hash = [u8; 32];

/// A 64-byte Ed25519 signature.
pub type Signature = [u8; 64];

/// A 32-byte Ed25519 public key. The durable identity of miners and validators.
pub type PublicKey = [u8; 32];

/// Account address (wallet encoding is handled outside the engine).
pub type Address = [u8; 32];

/// Miner identity: the miner's Ed25519 public key.
pub type MinerId = PublicKey;

/// All-zero hash, used as the merkle root of an empty transaction set.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Render a hash as lowercase hex.
pub fn hash_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// Short hex prefix for log lines.
pub fn short_hex(hash: &Hash) -> String {
    hex::encode(&hash[..6])
}

/// Parse a 32-byte hash from hex.
pub fn hash_from_hex(s: &str) -> Result<Hash, CodecError> {
    let bytes = hex::decode(s).map_err(|e| CodecError::InvalidHex(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|v: Vec<u8>| CodecError::InvalidLength {
            expected: 32,
            actual: v.len(),
        })
}

// =============================================================================
// TRANSACTIONS
// =============================================================================

/// A value transfer carried by a block.
///
/// Scripting semantics are out of scope; the engine only checks structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender account.
    pub from: Option<Address>,
    /// Recipient account.
    pub to: Option<Address>,
    /// Amount transferred in base units.
    pub amount: u64,
    /// Fee paid to the producer in base units.
    pub fee: u64,
    /// Sender nonce.
    pub nonce: u64,
    /// Opaque payload.
    pub data: Vec<u8>,
}

impl Transaction {
    /// Create a plain transfer.
    pub fn transfer(from: Address, to: Address, amount: u64, fee: u64, nonce: u64) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            amount,
            fee,
            nonce,
            data: Vec::new(),
        }
    }

    /// Compute the transaction hash.
    pub fn hash(&self) -> Hash {
        let mut bytes = Vec::with_capacity(96 + self.data.len());
        match &self.from {
            Some(from) => {
                bytes.push(1);
                bytes.extend_from_slice(from);
            }
            None => bytes.push(0),
        }
        match &self.to {
            Some(to) => {
                bytes.push(1);
                bytes.extend_from_slice(to);
            }
            None => bytes.push(0),
        }
        bytes.extend_from_slice(&self.amount.to_le_bytes());
        bytes.extend_from_slice(&self.fee.to_le_bytes());
        bytes.extend_from_slice(&self.nonce.to_le_bytes());
        bytes.extend_from_slice(&self.data);
        sha256(&bytes)
    }

    /// Structural soundness: non-zero amount and both endpoints present.
    ///
    /// Fees are unsigned, so the non-negative fee rule holds by construction.
    pub fn is_structurally_sound(&self) -> bool {
        self.amount > 0 && self.from.is_some() && self.to.is_some()
    }
}

// =============================================================================
// BLOCKS
// =============================================================================

/// The hashed portion of a block.
///
/// Every field participates in [`BlockHeader::hash`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Parent hashes (1..N for non-genesis blocks; empty for genesis).
    pub parent_hashes: Vec<Hash>,
    /// Height: one more than the highest parent.
    pub height: u64,
    /// Merkle root of the block's transactions.
    pub merkle_root: Hash,
    /// Unix timestamp (seconds), fixed once per header construction.
    pub timestamp: u64,
    /// Required leading zero hex characters of the hash.
    pub difficulty: u32,
    /// Proof-of-work nonce.
    pub nonce: u64,
    /// Producing miner's public key.
    pub miner_id: MinerId,
}

impl BlockHeader {
    /// Compute the canonical header hash.
    pub fn hash(&self) -> Hash {
        block_hash(
            &self.parent_hashes,
            self.height,
            &self.merkle_root,
            self.timestamp,
            self.difficulty,
            self.nonce,
            &self.miner_id,
        )
    }

    /// Genesis blocks have no parents.
    pub fn is_genesis(&self) -> bool {
        self.parent_hashes.is_empty()
    }
}

/// A produced block.
///
/// Immutable once hashed: `hash` must equal `header.hash()`, and the header's
/// merkle root must match `transactions`. `stake_amount` and `signature` are
/// envelope fields outside the hash preimage.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Header hash.
    pub hash: Hash,
    /// Hashed header.
    pub header: BlockHeader,
    /// Carried transactions.
    pub transactions: Vec<Transaction>,
    /// Stake backing this block, if the producer committed any.
    pub stake_amount: Option<u128>,
    /// Producer signature over the serialized block bytes.
    #[serde_as(as = "Option<Bytes>")]
    pub signature: Option<Signature>,
}

impl Block {
    /// Seal a mined header together with its transactions.
    pub fn seal(header: BlockHeader, transactions: Vec<Transaction>) -> Self {
        Self {
            hash: header.hash(),
            header,
            transactions,
            stake_amount: None,
            signature: None,
        }
    }

    /// Attach a stake commitment.
    pub fn with_stake(mut self, stake: u128) -> Self {
        self.stake_amount = Some(stake);
        self
    }

    /// Parent hashes.
    pub fn parents(&self) -> &[Hash] {
        &self.header.parent_hashes
    }

    /// Block height.
    pub fn height(&self) -> u64 {
        self.header.height
    }

    /// Recomputed hash matches the stored hash.
    pub fn verify_hash(&self) -> bool {
        self.header.hash() == self.hash
    }

    /// Header merkle root matches the carried transactions.
    pub fn verify_merkle_root(&self) -> bool {
        let tx_hashes: Vec<Hash> = self.transactions.iter().map(Transaction::hash).collect();
        compute_merkle_root(&tx_hashes) == self.header.merkle_root
    }

    /// The stored hash satisfies the header's difficulty.
    pub fn verify_pow(&self) -> bool {
        meets_difficulty(&self.hash, self.header.difficulty)
    }

    /// Canonical bytes covered by the producer signature.
    ///
    /// The signature field itself is cleared before encoding.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut unsigned = self.clone();
        unsigned.signature = None;
        unsigned.to_bytes()
    }

    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(self).map_err(|e| CodecError::Serialization(e.to_string()))
    }

    /// Decode from bincode.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        bincode::deserialize(bytes).map_err(|e| CodecError::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> BlockHeader {
        BlockHeader {
            parent_hashes: vec![[1u8; 32]],
            height: 5,
            merkle_root: ZERO_HASH,
            timestamp: 1_700_000_000,
            difficulty: 0,
            nonce: 7,
            miner_id: [9u8; 32],
        }
    }

    #[test]
    fn test_seal_sets_hash() {
        let block = Block::seal(header(), vec![]);
        assert!(block.verify_hash());
        assert!(block.verify_merkle_root());
        assert!(block.verify_pow());
    }

    #[test]
    fn test_changing_any_header_field_changes_hash() {
        let base = header().hash();

        let mut h = header();
        h.parent_hashes.push([2u8; 32]);
        assert_ne!(h.hash(), base);

        let mut h = header();
        h.height += 1;
        assert_ne!(h.hash(), base);

        let mut h = header();
        h.merkle_root = [3u8; 32];
        assert_ne!(h.hash(), base);

        let mut h = header();
        h.timestamp += 1;
        assert_ne!(h.hash(), base);

        let mut h = header();
        h.difficulty += 1;
        assert_ne!(h.hash(), base);

        let mut h = header();
        h.nonce += 1;
        assert_ne!(h.hash(), base);

        let mut h = header();
        h.miner_id = [8u8; 32];
        assert_ne!(h.hash(), base);
    }

    #[test]
    fn test_tampered_block_fails_hash_check() {
        let mut block = Block::seal(header(), vec![]);
        block.header.nonce += 1;
        assert!(!block.verify_hash());
    }

    #[test]
    fn test_transaction_structure() {
        let ok = Transaction::transfer([1; 32], [2; 32], 10, 0, 0);
        assert!(ok.is_structurally_sound());

        let zero = Transaction::transfer([1; 32], [2; 32], 0, 1, 0);
        assert!(!zero.is_structurally_sound());

        let mut no_recipient = ok.clone();
        no_recipient.to = None;
        assert!(!no_recipient.is_structurally_sound());
    }

    #[test]
    fn test_signing_bytes_ignore_signature() {
        let mut block = Block::seal(header(), vec![]);
        let unsigned = block.signing_bytes().unwrap();
        block.signature = Some([7u8; 64]);
        assert_eq!(block.signing_bytes().unwrap(), unsigned);
    }

    #[test]
    fn test_codec_preserves_signature() {
        let mut block = Block::seal(header(), vec![]).with_stake(500);
        block.signature = Some([7u8; 64]);
        let decoded = Block::from_bytes(&block.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, block);
    }

    #[test]
    fn test_hash_hex_parse() {
        let hash = [0xABu8; 32];
        assert_eq!(hash_from_hex(&hash_hex(&hash)).unwrap(), hash);
        assert!(hash_from_hex("abcd").is_err());
        assert!(hash_from_hex("zz").is_err());
    }
}
