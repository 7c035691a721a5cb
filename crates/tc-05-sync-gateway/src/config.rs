//! Sync gateway configuration

use serde::Deserialize;
use std::time::Duration;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SyncConfig {
    /// Total send attempts per block, counting the first
    pub max_attempts: u32,

    /// Fixed delay between attempts (milliseconds)
    pub retry_delay_ms: u64,

    /// Per-attempt transport timeout (milliseconds)
    pub request_timeout_ms: u64,

    /// Accepted distance between a block timestamp and the server clock (seconds)
    pub max_timestamp_skew_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 1_000,
            request_timeout_ms: 5_000,
            max_timestamp_skew_secs: 7_200,
        }
    }
}

impl SyncConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
