//! In-process transport: JSON bodies handed straight to a [`SyncServer`].

use crate::domain::TransportError;
use crate::ports::SyncTransport;
use crate::server::SyncServer;
use async_trait::async_trait;
use std::sync::Arc;

pub struct InProcessTransport {
    server: Arc<SyncServer>,
}

impl InProcessTransport {
    pub fn new(server: Arc<SyncServer>) -> Self {
        Self { server }
    }
}

#[async_trait]
impl SyncTransport for InProcessTransport {
    async fn send(&self, body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        Ok(self.server.handle_bytes(&body))
    }
}
