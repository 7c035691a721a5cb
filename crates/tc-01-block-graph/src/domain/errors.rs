//! Block graph errors.
//!
//! In-memory operations cannot fail; errors come from the optional store.

use shared_types::{CodecError, StoreError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Block store failure: {0}")]
    Store(#[from] StoreError),

    #[error("Block codec failure: {0}")]
    Codec(#[from] CodecError),
}

pub type GraphResult<T> = Result<T, GraphError>;
