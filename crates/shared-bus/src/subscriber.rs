//! # Subscriptions
//!
//! A [`Subscription`] sees every event on the bus and yields the ones its
//! filter matches. A subscriber that falls more than the bus capacity behind
//! skips the overwritten events and keeps going; [`Subscription::lagged`]
//! reports how many it missed.

use crate::events::{ConsensusEvent, EventFilter};
use crate::publisher::Listeners;
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::warn;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("Event bus closed")]
    Closed,
}

/// Receiving end of the bus. Dropping it unregisters the listener.
pub struct Subscription {
    receiver: broadcast::Receiver<ConsensusEvent>,
    filter: EventFilter,
    listeners: Arc<Mutex<Listeners>>,
    lagged: u64,
}

impl Subscription {
    pub(crate) fn new(
        receiver: broadcast::Receiver<ConsensusEvent>,
        filter: EventFilter,
        listeners: Arc<Mutex<Listeners>>,
    ) -> Self {
        Self {
            receiver,
            filter,
            listeners,
            lagged: 0,
        }
    }

    /// Next matching event; `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<ConsensusEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(RecvError::Lagged(missed)) => self.record_lag(missed),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next buffered matching event, if any.
    pub fn try_recv(&mut self) -> Result<Option<ConsensusEvent>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Ok(Some(event)),
                Ok(_) => {}
                Err(TryRecvError::Lagged(missed)) => self.record_lag(missed),
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Closed) => return Err(SubscriptionError::Closed),
            }
        }
    }

    /// Every matching event buffered right now.
    pub fn drain(&mut self) -> Vec<ConsensusEvent> {
        std::iter::from_fn(|| self.try_recv().ok().flatten()).collect()
    }

    /// Events skipped because this subscriber fell behind.
    #[must_use]
    pub fn lagged(&self) -> u64 {
        self.lagged
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    fn record_lag(&mut self, missed: u64) {
        self.lagged += missed;
        warn!(missed, topics = ?self.filter.topics, "Event subscriber lagged");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.listeners.lock().leave(&self.filter);
    }
}
