//! # Ports
//!
//! - [`SyncTransport`]: moves a JSON request body to a server, returns the body of its reply
//! - [`BlockVerifier`]: the validating node's own block check
//! - [`BlockSink`]: where accepted blocks go

use crate::domain::TransportError;
use async_trait::async_trait;
use shared_types::{Block, Hash};

/// Request/response transport. Server verdicts always arrive as a
/// successful reply; only failures to reach the server are errors.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    async fn send(&self, body: Vec<u8>) -> Result<Vec<u8>, TransportError>;
}

pub trait BlockVerifier: Send + Sync {
    /// Err carries the human-readable reason.
    fn verify(&self, block: &Block) -> Result<(), String>;
}

pub trait BlockSink: Send + Sync {
    fn contains(&self, hash: &Hash) -> bool;

    /// Store the block. `Ok(false)` if it was already stored.
    fn store(&self, block: Block) -> Result<bool, String>;
}
