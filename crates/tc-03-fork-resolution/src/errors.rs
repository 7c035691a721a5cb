//! Fork resolution errors

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ForkError {
    #[error("Unknown fork: {0}")]
    UnknownFork(Uuid),

    #[error("Fork {0} is already resolved")]
    AlreadyResolved(Uuid),

    #[error("Fork {0} is being resolved")]
    ResolutionInProgress(Uuid),

    #[error("Fork {0} has no chains to elect from")]
    NoChains(Uuid),
}

pub type ForkResult<T> = Result<T, ForkError>;
