//! Fork choice configuration

use serde::Deserialize;

/// Weights of the composite score terms. They should sum to 1.0.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoreWeights {
    pub difficulty: f64,
    pub stake: f64,
    pub transactions: f64,
    pub recency: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            difficulty: 0.4,
            stake: 0.3,
            transactions: 0.2,
            recency: 0.1,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.difficulty + self.stake + self.transactions + self.recency
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ForkChoiceConfig {
    pub weights: ScoreWeights,

    /// Total difficulty at which the difficulty term saturates
    pub difficulty_scale: f64,

    /// Total stake at which the stake term saturates
    pub stake_scale: f64,

    /// Transaction count at which the transaction term saturates
    pub transaction_scale: f64,

    /// Age (seconds) at which the recency term reaches zero
    pub recency_horizon_secs: u64,

    /// Maximum blocks walked back per branch when rebuilding a chain
    pub max_walk_depth: usize,

    /// Age (seconds) before the periodic sweep resolves a detected fork
    pub resolution_grace_secs: u64,
}

impl Default for ForkChoiceConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            difficulty_scale: 1e6,
            stake_scale: 1e4,
            transaction_scale: 1e3,
            recency_horizon_secs: 3_600,
            max_walk_depth: 1_024,
            resolution_grace_secs: 5,
        }
    }
}
