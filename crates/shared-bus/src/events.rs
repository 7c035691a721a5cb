//! # Consensus Events
//!
//! Facts published by the consensus components after their state changed.
//! Events are informational: no component depends on receiving one to stay
//! correct.

use serde::{Deserialize, Serialize};
use shared_types::{Hash, MinerId};
use uuid::Uuid;

/// An internal consensus event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConsensusEvent {
    /// A new block was inserted into the graph.
    BlockAdded {
        hash: Hash,
        height: u64,
        miner: MinerId,
    },

    /// Two or more blocks claim one height.
    ForkDetected {
        fork_id: Uuid,
        height: u64,
        chain_count: usize,
    },

    /// A fork elected its winning chain.
    ForkResolved {
        fork_id: Uuid,
        height: u64,
        winning_chain: String,
        rule: String,
        tie_broken: bool,
    },

    /// A block reached quorum and was finalized.
    BlockFinalized {
        hash: Hash,
        height: u64,
        yes_votes: usize,
    },

    /// A validator was penalized.
    ValidatorSlashed {
        validator: String,
        reason: String,
        penalty: u128,
        deactivated: bool,
    },

    /// A block failed validation.
    BlockRejected { hash: Hash, reason: String },
}

impl ConsensusEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::BlockAdded { .. } => EventTopic::Graph,
            Self::ForkDetected { .. } | Self::ForkResolved { .. } => EventTopic::Forks,
            Self::BlockFinalized { .. } | Self::BlockRejected { .. } => EventTopic::Finality,
            Self::ValidatorSlashed { .. } => EventTopic::Validators,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Block graph insertions.
    Graph,
    /// Fork lifecycle.
    Forks,
    /// Block acceptance and finalization.
    Finality,
    /// Validator set changes.
    Validators,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &ConsensusEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}
