//! # Block and Vote Signing
//!
//! - Producers sign the canonical block bytes (`Block::signing_bytes`); the
//!   miner id embedded in the header is the verifying key.
//! - Validators sign a domain-separated vote message over the block hash.

use crate::signatures::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
use crate::CryptoError;
use shared_types::{Block, Hash, PublicKey, Signature};

const VOTE_DOMAIN: &[u8] = b"tangle-chain/vote/v1";

/// Sign a block as its producer and attach the signature.
pub fn sign_block(block: &mut Block, keypair: &Ed25519KeyPair) -> Result<Signature, CryptoError> {
    let bytes = block
        .signing_bytes()
        .map_err(|e| CryptoError::Encoding(e.to_string()))?;
    let signature = *keypair.sign(&bytes).as_bytes();
    block.signature = Some(signature);
    Ok(signature)
}

/// Verify a producer signature over raw block bytes.
pub fn verify_block_signature(
    producer: &PublicKey,
    block_bytes: &[u8],
    signature: &Signature,
) -> Result<(), CryptoError> {
    Ed25519PublicKey::from_bytes(*producer)?
        .verify(block_bytes, &Ed25519Signature::from_bytes(*signature))
}

/// Message a validator signs to vote for a block.
pub fn vote_message(block_hash: &Hash) -> Vec<u8> {
    let mut message = Vec::with_capacity(VOTE_DOMAIN.len() + 32);
    message.extend_from_slice(VOTE_DOMAIN);
    message.extend_from_slice(block_hash);
    message
}

/// Sign a vote for `block_hash`.
pub fn sign_vote(block_hash: &Hash, keypair: &Ed25519KeyPair) -> Signature {
    *keypair.sign(&vote_message(block_hash)).as_bytes()
}

/// Verify a validator's vote signature.
pub fn verify_vote(
    validator_key: &PublicKey,
    block_hash: &Hash,
    signature: &Signature,
) -> Result<(), CryptoError> {
    Ed25519PublicKey::from_bytes(*validator_key)?.verify(
        &vote_message(block_hash),
        &Ed25519Signature::from_bytes(*signature),
    )
}
