//! # Sync Client
//!
//! Producer side. Transport failures are retried with a fixed delay up to
//! `max_attempts`; a reply from the server, accepting or not, ends the
//! submission.

use crate::config::SyncConfig;
use crate::domain::{SyncError, SyncRequest, SyncResponse, TransportError};
use crate::ports::SyncTransport;
use shared_crypto::Ed25519KeyPair;
use shared_types::Block;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A server verdict and how many sends it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub response: SyncResponse,
    pub attempts: u32,
}

impl Submission {
    pub fn accepted(&self) -> bool {
        self.response.accepted
    }
}

pub struct SyncClient {
    transport: Arc<dyn SyncTransport>,
    keypair: Ed25519KeyPair,
    config: SyncConfig,
}

impl SyncClient {
    pub fn new(transport: Arc<dyn SyncTransport>, keypair: Ed25519KeyPair, config: SyncConfig) -> Self {
        Self {
            transport,
            keypair,
            config,
        }
    }

    /// Sign and submit a block produced with this client's key.
    pub async fn submit(&self, block: &Block) -> Result<Submission, SyncError> {
        let request = SyncRequest::signed(block, &self.keypair)?;
        self.submit_request(&request).await
    }

    /// Submit a prepared request.
    #[tracing::instrument(skip(self, request), fields(hash = %request.hash))]
    pub async fn submit_request(&self, request: &SyncRequest) -> Result<Submission, SyncError> {
        let body = request.to_json()?;
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = TransportError::Closed;

        for attempt in 1..=max_attempts {
            let sent = tokio::time::timeout(
                self.config.request_timeout(),
                self.transport.send(body.clone()),
            )
            .await
            .unwrap_or(Err(TransportError::Timeout));

            match sent {
                Ok(reply) => {
                    let response = SyncResponse::from_json(&reply)?;
                    if response.accepted {
                        info!(attempt, block_number = ?response.block_number, "Block accepted by server");
                    } else {
                        warn!(attempt, reason = ?response.reason, "Block rejected by server");
                    }
                    return Ok(Submission {
                        response,
                        attempts: attempt,
                    });
                }
                Err(e) => {
                    warn!(attempt, max_attempts, error = %e, "Sync transport failure");
                    last_error = e;
                    if attempt < max_attempts {
                        tokio::time::sleep(self.config.retry_delay()).await;
                    }
                }
            }
        }

        debug!(max_attempts, "Giving up on submission");
        Err(SyncError::DeliveryFailed {
            attempts: max_attempts,
            last_error,
        })
    }
}
