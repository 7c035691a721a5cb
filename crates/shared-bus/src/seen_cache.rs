//! # Seen-Message Cache
//!
//! Gives the gossip boundary at-most-once delivery: a message id is accepted
//! the first time it is seen and dropped on every repeat.
//!
//! - Messages are only considered inside a timestamp window
//!   (`max_age` in the past, `max_future_skew` ahead)
//! - Ids are garbage-collected once they fall out of the retention window,
//!   which bounds memory without re-admitting live duplicates

use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Reasons a gossip message id is not admitted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SeenError {
    /// The message id was already delivered.
    #[error("Message {id} already delivered")]
    Duplicate { id: Uuid },

    /// The message timestamp is too old.
    #[error("Message timestamp {timestamp} is too old (threshold: {threshold})")]
    TooOld { timestamp: u64, threshold: u64 },

    /// The message timestamp is in the future.
    #[error("Message timestamp {timestamp} is in the future (threshold: {threshold})")]
    FromFuture { timestamp: u64, threshold: u64 },
}

/// Time-bounded set of delivered gossip message ids.
///
/// Retention is twice the admission window so an id cannot expire while a
/// copy of its message could still be admitted.
#[derive(Debug)]
pub struct SeenMessageCache {
    /// Message id -> message timestamp.
    seen: HashMap<Uuid, u64>,
    max_age_secs: u64,
    max_future_skew_secs: u64,
    last_gc: u64,
    gc_interval_secs: u64,
}

impl SeenMessageCache {
    /// Default maximum age of an admitted message.
    pub const DEFAULT_MAX_AGE: u64 = 60;

    /// Default maximum future skew of an admitted message.
    pub const DEFAULT_MAX_FUTURE_SKEW: u64 = 10;

    /// Default garbage collection interval.
    pub const DEFAULT_GC_INTERVAL: u64 = 10;

    #[must_use]
    pub fn new() -> Self {
        Self::with_window(Self::DEFAULT_MAX_AGE, Self::DEFAULT_MAX_FUTURE_SKEW)
    }

    #[must_use]
    pub fn with_window(max_age_secs: u64, max_future_skew_secs: u64) -> Self {
        Self {
            seen: HashMap::new(),
            max_age_secs,
            max_future_skew_secs,
            last_gc: 0,
            gc_interval_secs: Self::DEFAULT_GC_INTERVAL,
        }
    }

    /// Admit `id` if its timestamp is in the window and it was not seen yet.
    ///
    /// The timestamp check runs first so stale traffic never touches the map.
    pub fn check_and_insert(&mut self, id: Uuid, timestamp: u64, now: u64) -> Result<(), SeenError> {
        let min_valid = now.saturating_sub(self.max_age_secs);
        let max_valid = now.saturating_add(self.max_future_skew_secs);

        if timestamp < min_valid {
            return Err(SeenError::TooOld {
                timestamp,
                threshold: min_valid,
            });
        }
        if timestamp > max_valid {
            return Err(SeenError::FromFuture {
                timestamp,
                threshold: max_valid,
            });
        }

        if now.saturating_sub(self.last_gc) > self.gc_interval_secs {
            self.garbage_collect(now);
            self.last_gc = now;
        }

        if self.seen.contains_key(&id) {
            return Err(SeenError::Duplicate { id });
        }
        self.seen.insert(id, timestamp);
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, id: &Uuid) -> bool {
        self.seen.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    fn garbage_collect(&mut self, now: u64) {
        let retention = self
            .max_age_secs
            .saturating_add(self.max_future_skew_secs)
            .saturating_mul(2);
        let expiry = now.saturating_sub(retention);
        self.seen.retain(|_, &mut ts| ts > expiry);
    }
}

impl Default for SeenMessageCache {
    fn default() -> Self {
        Self::new()
    }
}
