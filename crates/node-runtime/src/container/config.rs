//! # Node Configuration
//!
//! Unified configuration for every component plus runtime parameters.
//!
//! Values start from defaults and are then overridden from the environment:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `TC_MINING_THREADS` | `mining.threads` (clamped to `1..=MAX_MINING_THREADS`) |
//! | `TC_DIFFICULTY` | `mining.difficulty` |
//! | `TC_MIN_STAKE` | `consensus.min_stake` |
//! | `TC_SYNC_MAX_ATTEMPTS` | `sync.max_attempts` |
//! | `TC_SYNC_RETRY_DELAY_MS` | `sync.retry_delay_ms` |
//! | `TC_FORK_GRACE_SECS` | `fork_choice.resolution_grace_secs` |
//!
//! Unparseable values are ignored with a warning.

use serde::Deserialize;
use shared_bus::DEFAULT_CHANNEL_CAPACITY;
use shared_types::MAX_DIFFICULTY;
use std::str::FromStr;
use std::time::Duration;
use tc_02_pow_miner::config::MAX_MINING_THREADS;
use tc_02_pow_miner::PowConfig;
use tc_03_fork_resolution::ForkChoiceConfig;
use tc_04_hybrid_consensus::ConsensusConfig;
use tc_05_sync_gateway::SyncConfig;
use thiserror::Error;
use tracing::warn;

/// Complete node configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct NodeConfig {
    /// Identity and runtime settings.
    pub node: NodeSettings,
    /// Proof-of-work mining.
    pub mining: PowConfig,
    /// Fork scoring and resolution.
    pub fork_choice: ForkChoiceConfig,
    /// Validator set and finalization.
    pub consensus: ConsensusConfig,
    /// Remote block submission.
    pub sync: SyncConfig,
    /// Scheduled task periods.
    pub tasks: TaskConfig,
}

/// Identity and runtime settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NodeSettings {
    /// Validator id used for the local vote.
    pub node_id: String,
    /// Hex-encoded 32-byte Ed25519 seed. A fresh key is generated when unset.
    pub key_seed: Option<String>,
    /// Stake registered for the local validator; 0 runs without voting.
    pub validator_stake: u128,
    /// Start mining workers on `start()`.
    pub mining_enabled: bool,
    /// Pending transactions held for candidates.
    pub mempool_capacity: usize,
    /// Per-subscriber event queue depth.
    pub event_capacity: usize,
    /// Inbound and outbound gossip queue depth.
    pub gossip_capacity: usize,
    /// Announced-but-missing block hashes remembered; the oldest is
    /// forgotten once full.
    pub wanted_capacity: usize,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            node_id: "node-0".to_string(),
            key_seed: None,
            validator_stake: 1_000,
            mining_enabled: true,
            mempool_capacity: 10_000,
            event_capacity: DEFAULT_CHANNEL_CAPACITY,
            gossip_capacity: 256,
            wanted_capacity: 4_096,
        }
    }
}

impl NodeSettings {
    /// Decode the configured seed, if any.
    pub fn seed(&self) -> Result<Option<[u8; 32]>, ConfigError> {
        let Some(encoded) = &self.key_seed else {
            return Ok(None);
        };
        let bytes = hex::decode(encoded.trim_start_matches("0x"))
            .map_err(|e| ConfigError::InvalidKeySeed(e.to_string()))?;
        let seed: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| ConfigError::InvalidKeySeed(format!("expected 32 bytes, got {}", b.len())))?;
        Ok(Some(seed))
    }
}

/// Scheduled task periods.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TaskConfig {
    /// Resolve forks past their grace period.
    pub fork_sweep_ms: u64,
    /// Retry finalization of pending blocks and act on equivocation evidence.
    pub finalize_sweep_ms: u64,
    /// Announce the local best height.
    pub heartbeat_ms: u64,
    /// Resolved forks older than this are forgotten.
    pub prune_resolved_after_secs: u64,
    /// Vote records of blocks finalized longer ago than this are dropped.
    pub prune_finalized_after_secs: u64,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            fork_sweep_ms: 1_000,
            finalize_sweep_ms: 1_000,
            heartbeat_ms: 5_000,
            prune_resolved_after_secs: 3_600,
            prune_finalized_after_secs: 3_600,
        }
    }
}

impl TaskConfig {
    pub fn fork_sweep(&self) -> Duration {
        Duration::from_millis(self.fork_sweep_ms)
    }

    pub fn finalize_sweep(&self) -> Duration {
        Duration::from_millis(self.finalize_sweep_ms)
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms)
    }
}

impl NodeConfig {
    /// Defaults with `TC_*` overrides from the process environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply `TC_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(threads) = parse_var::<usize, _>(&lookup, "TC_MINING_THREADS") {
            self.mining.threads = threads.clamp(1, MAX_MINING_THREADS);
        }
        if let Some(difficulty) = parse_var(&lookup, "TC_DIFFICULTY") {
            self.mining.difficulty = difficulty;
        }
        if let Some(min_stake) = parse_var(&lookup, "TC_MIN_STAKE") {
            self.consensus.min_stake = min_stake;
        }
        if let Some(attempts) = parse_var(&lookup, "TC_SYNC_MAX_ATTEMPTS") {
            self.sync.max_attempts = attempts;
        }
        if let Some(delay) = parse_var(&lookup, "TC_SYNC_RETRY_DELAY_MS") {
            self.sync.retry_delay_ms = delay;
        }
        if let Some(grace) = parse_var(&lookup, "TC_FORK_GRACE_SECS") {
            self.fork_choice.resolution_grace_secs = grace;
        }
    }

    /// Reject combinations the node cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if self.consensus.vote_power_divisor == 0 {
            return Err(ConfigError::ZeroVoteDivisor);
        }
        if self.mining.difficulty > MAX_DIFFICULTY {
            return Err(ConfigError::DifficultyTooHigh(self.mining.difficulty));
        }
        let stake = self.node.validator_stake;
        if stake > 0 && stake < self.consensus.min_stake {
            return Err(ConfigError::StakeBelowMinimum {
                stake,
                min_stake: self.consensus.min_stake,
            });
        }
        let periods = [
            ("fork_sweep_ms", self.tasks.fork_sweep_ms),
            ("finalize_sweep_ms", self.tasks.finalize_sweep_ms),
            ("heartbeat_ms", self.tasks.heartbeat_ms),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, ms)| *ms == 0) {
            return Err(ConfigError::ZeroInterval(*name));
        }
        self.node.seed()?;
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var = key, value = %raw, "Ignoring unparseable environment override");
            None
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("sync.max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("consensus.vote_power_divisor must be non-zero")]
    ZeroVoteDivisor,

    #[error("Difficulty {0} exceeds maximum {max}", max = MAX_DIFFICULTY)]
    DifficultyTooHigh(u32),

    #[error("Validator stake {stake} is below the minimum {min_stake}")]
    StakeBelowMinimum { stake: u128, min_stake: u128 },

    #[error("tasks.{0} must be non-zero")]
    ZeroInterval(&'static str),

    #[error("Invalid key seed: {0}")]
    InvalidKeySeed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(NodeConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_overrides_applied() {
        let mut config = NodeConfig::default();
        config.apply_overrides(env(&[
            ("TC_MINING_THREADS", "2"),
            ("TC_DIFFICULTY", "3"),
            ("TC_MIN_STAKE", "500"),
            ("TC_SYNC_MAX_ATTEMPTS", "7"),
            ("TC_SYNC_RETRY_DELAY_MS", "25"),
            ("TC_FORK_GRACE_SECS", "9"),
        ]));

        assert_eq!(config.mining.threads, 2);
        assert_eq!(config.mining.difficulty, 3);
        assert_eq!(config.consensus.min_stake, 500);
        assert_eq!(config.sync.max_attempts, 7);
        assert_eq!(config.sync.retry_delay_ms, 25);
        assert_eq!(config.fork_choice.resolution_grace_secs, 9);
    }

    #[test]
    fn test_unparseable_override_ignored() {
        let mut config = NodeConfig::default();
        config.apply_overrides(env(&[("TC_DIFFICULTY", "hard")]));
        assert_eq!(config.mining.difficulty, PowConfig::default().difficulty);
    }

    #[test]
    fn test_thread_override_clamped() {
        let mut config = NodeConfig::default();
        config.apply_overrides(env(&[("TC_MINING_THREADS", "0")]));
        assert_eq!(config.mining.threads, 1);

        config.apply_overrides(env(&[("TC_MINING_THREADS", "100000")]));
        assert_eq!(config.mining.threads, MAX_MINING_THREADS);
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = NodeConfig::default();
        config.sync.max_attempts = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroAttempts));
    }

    #[test]
    fn test_validate_rejects_zero_vote_divisor() {
        let mut config = NodeConfig::default();
        config.consensus.vote_power_divisor = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroVoteDivisor));
    }

    #[test]
    fn test_validate_rejects_understaked_validator() {
        let mut config = NodeConfig::default();
        config.node.validator_stake = config.consensus.min_stake - 1;
        assert!(matches!(config.validate(), Err(ConfigError::StakeBelowMinimum { .. })));

        config.node.validator_stake = 0;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_seed_decoding() {
        let mut settings = NodeSettings::default();
        assert_eq!(settings.seed(), Ok(None));

        settings.key_seed = Some(hex::encode([7u8; 32]));
        assert_eq!(settings.seed(), Ok(Some([7u8; 32])));

        settings.key_seed = Some("abcd".into());
        assert!(matches!(settings.seed(), Err(ConfigError::InvalidKeySeed(_))));
    }

    #[test]
    fn test_config_from_json() {
        let config: NodeConfig =
            serde_json::from_str(r#"{"node": {"node_id": "v1"}, "tasks": {"heartbeat_ms": 250}}"#).unwrap();
        assert_eq!(config.node.node_id, "v1");
        assert_eq!(config.tasks.heartbeat_ms, 250);
        assert_eq!(config.tasks.fork_sweep_ms, TaskConfig::default().fork_sweep_ms);
    }
}
