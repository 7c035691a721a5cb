//! # Sync Gateway (tc-05)
//!
//! Lets an offline miner deliver a mined block to a validating node.
//!
//! ## Protocol
//!
//! ```text
//! producer                                   validator
//!    │  SyncRequest {blockBytes, hash, minerID,     │
//!    │               signature, timestamp,          │
//!    │               difficulty, nonce}             │
//!    │ ────────────────────────────────────────────▶│ decode, re-hash, verify
//!    │                                              │ signature / skew / PoW,
//!    │  SyncResponse {accepted, blockNumber|reason} │ validate, store
//!    │ ◀────────────────────────────────────────────│
//! ```
//!
//! ## Retry Policy
//!
//! | Outcome | Retried |
//! |---------|---------|
//! | transport error / timeout | yes, fixed delay, up to `max_attempts` |
//! | `accepted: false` | never |
//! | `accepted: true` | - |
//!
//! A signature mismatch, out-of-skew timestamp or PoW failure is a verdict,
//! not a transport error.

pub mod client;
pub mod config;
pub mod domain;
pub mod ports;
pub mod server;
pub mod transport;

pub use client::{Submission, SyncClient};
pub use config::SyncConfig;
pub use domain::{DecodedRequest, RejectReason, SyncError, SyncRequest, SyncResponse, TransportError};
pub use ports::{BlockSink, BlockVerifier, SyncTransport};
pub use server::SyncServer;
pub use transport::InProcessTransport;
