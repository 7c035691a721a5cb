//! Error types for mining

use thiserror::Error;

/// Result type alias for mining operations
pub type Result<T> = std::result::Result<T, MiningError>;

/// Errors that can occur while mining
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MiningError {
    /// No hash has more leading zero hex characters than it has characters
    #[error("Difficulty {requested} exceeds maximum {max}")]
    DifficultyTooHigh { requested: u32, max: u32 },

    /// The stop flag was raised before a nonce was found
    #[error("Mining cancelled after {attempts} attempts")]
    Cancelled { attempts: u64 },

    /// Every nonce was tried without success
    #[error("Nonce space exhausted")]
    NonceSpaceExhausted,

    /// A worker thread could not be started
    #[error("Failed to spawn mining worker: {0}")]
    WorkerSpawn(String),
}
