//! # Sync Errors
//!
//! Transport failures are retried; everything the server says is final.

use thiserror::Error;

/// Failure to get a request to the server and a reply back.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Transport closed")]
    Closed,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    /// Every attempt failed in transport. The block can be resubmitted.
    #[error("Delivery failed after {attempts} attempts: {last_error}")]
    DeliveryFailed {
        attempts: u32,
        last_error: TransportError,
    },

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Block was not produced by this key")]
    ForeignBlock,
}

impl SyncError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DeliveryFailed { .. })
    }
}

/// Why the server refused a block.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RejectReason {
    #[error("malformed request: {0}")]
    Malformed(String),

    #[error("request field {0} does not match the block header")]
    FieldMismatch(&'static str),

    #[error("hash mismatch: block hashes to {computed}")]
    HashMismatch { computed: String },

    #[error("producer signature does not verify")]
    BadSignature,

    #[error("timestamp {timestamp} is {skew}s away from server time")]
    TimestampSkew { timestamp: u64, skew: u64 },

    #[error("proof of work does not meet difficulty {0}")]
    InsufficientPoW(u32),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("storage failed: {0}")]
    Storage(String),
}
