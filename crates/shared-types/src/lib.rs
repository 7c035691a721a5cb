//! # Shared Types Crate
//!
//! Data model and driven ports shared by every Tangle-Chain component.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Block`, `BlockHeader` and `Transaction` are
//!   defined once here and consumed read-only by the fork resolver and the
//!   validator layer. Only the block graph owns block storage.
//! - **Hash Binds Every Header Field**: `BlockHeader::hash` covers all header
//!   fields; a block whose stored hash differs from the recomputed one is
//!   structurally invalid.
//! - **Injected Capabilities**: persistence (`KeyValueStore`), wall-clock time
//!   (`TimeSource`) and block lookup (`BlockLookup`) are ports, never globals.

pub mod entities;
pub mod errors;
pub mod hashing;
pub mod ports;

pub use entities::*;
pub use errors::*;
pub use hashing::{
    block_hash, compute_merkle_root, leading_zero_hex_chars, meets_difficulty, sha256,
    MAX_DIFFICULTY,
};
pub use ports::{
    BlockLookup, FixedTimeSource, InMemoryKVStore, KeyValueStore, SystemTimeSource, TimeSource,
};
