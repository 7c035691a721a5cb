//! Wire records and error taxonomy.

pub mod errors;
pub mod wire;

pub use errors::{RejectReason, SyncError, TransportError};
pub use wire::{DecodedRequest, SyncRequest, SyncResponse};
