//! # Shared Bus - Gossip Boundary and Consensus Events
//!
//! Two directions of traffic meet here:
//!
//! - **Inbound gossip.** The peer layer delivers loosely-typed byte payloads,
//!   unordered and at-most-once. [`GossipInbox`] drops repeated message ids
//!   through a [`SeenMessageCache`] and decodes each payload exactly once into
//!   a [`GossipMessage`] before anything reaches consensus logic.
//! - **Internal events.** Components announce what they did (block added,
//!   fork resolved, block finalized, validator slashed) on an
//!   [`InMemoryEventBus`] for whoever subscribes.
//!
//! ```text
//! peer layer ──RawMessage──▶ GossipInbox ──GossipMessage──▶ node runtime
//!                                                             │
//!                                              emit()         ▼
//!              subscribers ◀──ConsensusEvent── InMemoryEventBus
//! ```
//!
//! Gossip is a hint channel: a `NewBlock` announcement asks the receiver to
//! re-check its graph, it never carries the block into storage by itself.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod gossip;
pub mod publisher;
pub mod seen_cache;
pub mod subscriber;

// Re-export main types
pub use events::{ConsensusEvent, EventFilter, EventTopic};
pub use gossip::{GossipError, GossipInbox, GossipMessage, GossipTopic, RawMessage};
pub use publisher::{BusStats, InMemoryEventBus};
pub use seen_cache::{SeenError, SeenMessageCache};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
