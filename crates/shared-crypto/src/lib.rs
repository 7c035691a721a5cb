//! # Shared Crypto - Ed25519 Identities
//!
//! Every miner and validator is identified by an Ed25519 public key.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `signatures` | Ed25519 | Key pairs, raw sign/verify |
//! | `block_signing` | Ed25519 over bincode bytes | Producer block signatures, validator votes |
//!
//! ## Security Properties
//!
//! - **Ed25519**: Deterministic nonces, no RNG dependency when signing
//! - Secret key material is zeroized on drop

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod block_signing;
pub mod errors;
pub mod signatures;

// Re-exports
pub use block_signing::{sign_block, sign_vote, verify_block_signature, verify_vote, vote_message};
pub use errors::CryptoError;
pub use signatures::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
