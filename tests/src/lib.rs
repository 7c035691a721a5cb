//! # Tangle-Chain Test Suite
//!
//! Cross-component scenarios that no single crate can test on its own.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs        # keys, clocks, block builders
//!     ├── mining_flow.rs     # mine → graph → votes → finalization → rewards
//!     ├── fork_flow.rs       # collision → chain rebuild → election
//!     ├── consensus_flow.rs  # equivocation → slash → quorum recomputed
//!     ├── sync_flow.rs       # producer client → transport → validating node
//!     └── gossip_flow.rs     # dedup, wanted hashes, delivery through sync
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p tc-tests
//! cargo test -p tc-tests integration::sync_flow
//! ```

#![allow(dead_code)]

pub mod integration;
