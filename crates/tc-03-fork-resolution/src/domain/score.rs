//! # Composite Chain Score
//!
//! `w_d·norm(difficulty) + w_s·norm(stake) + w_t·norm(tx) + w_r·recency`,
//! where `norm(x, s) = min(x / s, 1)` and
//! `recency = max(0, 1 - age / horizon)`.

use crate::config::ForkChoiceConfig;
use crate::domain::Chain;
use serde::{Deserialize, Serialize};

/// The weighted term that dominated a winner's score, kept for audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionRule {
    Difficulty,
    Stake,
    TransactionCount,
    Recency,
}

impl std::fmt::Display for ResolutionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Difficulty => "difficulty",
            Self::Stake => "stake",
            Self::TransactionCount => "transaction-count",
            Self::Recency => "recency",
        };
        f.write_str(name)
    }
}

/// Weighted terms of one chain's score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainScore {
    pub difficulty: f64,
    pub stake: f64,
    pub transactions: f64,
    pub recency: f64,
}

fn norm(value: f64, scale: f64) -> f64 {
    if scale <= 0.0 {
        return 1.0;
    }
    (value / scale).min(1.0)
}

impl ChainScore {
    pub fn compute(chain: &Chain, config: &ForkChoiceConfig, now: u64) -> Self {
        let w = &config.weights;
        let age = now.saturating_sub(chain.last_timestamp) as f64;
        let horizon = config.recency_horizon_secs.max(1) as f64;

        Self {
            difficulty: w.difficulty * norm(chain.total_difficulty as f64, config.difficulty_scale),
            stake: w.stake * norm(chain.total_stake as f64, config.stake_scale),
            transactions: w.transactions
                * norm(chain.transaction_count as f64, config.transaction_scale),
            recency: w.recency * (1.0 - age / horizon).max(0.0),
        }
    }

    pub fn total(&self) -> f64 {
        self.difficulty + self.stake + self.transactions + self.recency
    }

    /// Largest weighted term; earlier terms win exact ties.
    pub fn dominant(&self) -> ResolutionRule {
        let terms = [
            (ResolutionRule::Difficulty, self.difficulty),
            (ResolutionRule::Stake, self.stake),
            (ResolutionRule::TransactionCount, self.transactions),
            (ResolutionRule::Recency, self.recency),
        ];
        let mut best = terms[0];
        for term in &terms[1..] {
            if term.1 > best.1 {
                best = *term;
            }
        }
        best.0
    }
}

/// Scores closer than this are treated as equal.
pub const SCORE_EPSILON: f64 = 1e-12;

/// Outcome of an election among competing chains.
#[derive(Debug, Clone, PartialEq)]
pub struct Election {
    pub winner: Chain,
    pub score: ChainScore,
    /// More than one chain shared the top score.
    pub tie_broken: bool,
}

/// Elect the highest-scoring chain; equal scores go to the lowest chain id.
pub fn elect(chains: &[Chain], config: &ForkChoiceConfig, now: u64) -> Option<Election> {
    let scored: Vec<(&Chain, ChainScore)> = chains
        .iter()
        .map(|c| (c, ChainScore::compute(c, config, now)))
        .collect();

    let best_total = scored
        .iter()
        .map(|(_, s)| s.total())
        .fold(f64::NEG_INFINITY, f64::max);

    let top: Vec<&(&Chain, ChainScore)> = scored
        .iter()
        .filter(|(_, s)| best_total - s.total() <= SCORE_EPSILON)
        .collect();

    let (winner, score) = top.iter().min_by(|a, b| a.0.id.cmp(&b.0.id))?;
    Some(Election {
        winner: (*winner).clone(),
        score: *score,
        tie_broken: top.len() > 1,
    })
}
