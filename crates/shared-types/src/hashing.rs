//! Hashing utilities
//!
//! Canonical block hash, merkle root and the leading-zero PoW predicate.
//! Integers are encoded little-endian in every preimage.

use crate::entities::{Hash, MinerId, ZERO_HASH};
use sha2::{Digest, Sha256};

/// Maximum meaningful difficulty: a 32-byte hash has 64 hex characters.
pub const MAX_DIFFICULTY: u32 = 64;

/// Compute SHA-256 hash of data
#[inline]
pub fn sha256(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Canonical block hash.
///
/// `SHA256(parents ‖ height ‖ merkle_root ‖ timestamp ‖ difficulty ‖ nonce ‖ miner_id)`.
/// The parent count is prefixed so that parent lists cannot alias other fields.
pub fn block_hash(
    parents: &[Hash],
    height: u64,
    merkle_root: &Hash,
    timestamp: u64,
    difficulty: u32,
    nonce: u64,
    miner_id: &MinerId,
) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update((parents.len() as u32).to_le_bytes());
    for parent in parents {
        hasher.update(parent);
    }
    hasher.update(height.to_le_bytes());
    hasher.update(merkle_root);
    hasher.update(timestamp.to_le_bytes());
    hasher.update(difficulty.to_le_bytes());
    hasher.update(nonce.to_le_bytes());
    hasher.update(miner_id);
    hasher.finalize().into()
}

/// Count leading zero hex characters (nibbles) of a hash.
#[inline]
pub fn leading_zero_hex_chars(hash: &Hash) -> u32 {
    let mut count = 0;
    for byte in hash {
        if *byte == 0 {
            count += 2;
            continue;
        }
        if byte >> 4 == 0 {
            count += 1;
        }
        break;
    }
    count
}

/// Check if hash meets difficulty: at least `difficulty` leading zero hex characters.
///
/// Difficulty 0 accepts every hash.
#[inline]
pub fn meets_difficulty(hash: &Hash, difficulty: u32) -> bool {
    leading_zero_hex_chars(hash) >= difficulty
}

/// Merkle root over transaction hashes.
///
/// Odd levels duplicate their last node. An empty set yields the zero hash.
pub fn compute_merkle_root(leaves: &[Hash]) -> Hash {
    if leaves.is_empty() {
        return ZERO_HASH;
    }

    let mut level: Vec<Hash> = leaves.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let left = &pair[0];
                let right = pair.get(1).unwrap_or(left);
                let mut hasher = Sha256::new();
                hasher.update(left);
                hasher.update(right);
                hasher.finalize().into()
            })
            .collect();
    }
    level[0]
}
