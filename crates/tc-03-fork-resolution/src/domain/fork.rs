//! # Fork Record
//!
//! One [`ForkInfo`] per height collision. Status moves forward only:
//! `Detected → Resolving → Resolved`.

use crate::domain::{Chain, ResolutionRule};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForkStatus {
    Detected,
    Resolving,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForkInfo {
    pub id: Uuid,
    /// The contested height.
    pub height: u64,
    pub chains: Vec<Chain>,
    /// Unix seconds.
    pub detected_at: u64,
    pub status: ForkStatus,
    pub winning_chain: Option<String>,
    pub resolution_rule: Option<ResolutionRule>,
    /// The winner shared the top score and won on lowest chain id.
    pub tie_broken: bool,
    pub resolved_at: Option<u64>,
}

impl ForkInfo {
    pub fn new(height: u64, chains: Vec<Chain>, detected_at: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            height,
            chains,
            detected_at,
            status: ForkStatus::Detected,
            winning_chain: None,
            resolution_rule: None,
            tie_broken: false,
            resolved_at: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status == ForkStatus::Resolved
    }

    /// New chains may join only before resolution starts.
    pub fn accepts_chains(&self) -> bool {
        self.status == ForkStatus::Detected
    }

    pub fn has_chain(&self, id: &str) -> bool {
        self.chains.iter().any(|c| c.id == id)
    }

    pub fn winner(&self) -> Option<&Chain> {
        let id = self.winning_chain.as_deref()?;
        self.chains.iter().find(|c| c.id == id)
    }
}

/// Counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkStats {
    pub detected: usize,
    pub resolving: usize,
    pub resolved: usize,
    pub tie_breaks: usize,
}
