//! # Error Types
//!
//! Errors shared across components.

use thiserror::Error;

/// Errors from the injected key-value store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Backend I/O failure.
    #[error("Store I/O error: {0}")]
    Io(String),

    /// Stored value could not be decoded.
    #[error("Corrupt value under key {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Encoding and decoding failures for blocks and wire fields.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Encoding failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Decoding failed.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Malformed hex string.
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Decoded value has the wrong length.
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
