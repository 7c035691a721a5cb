//! # Handlers
//!
//! - `ingestion`: the full-block pipeline shared by mining and sync
//! - `gossip`: decoded peer messages, wanted hashes, outbound announcements
//! - `sweeps`: single passes of the scheduled tasks

pub mod gossip;
pub mod ingestion;
pub mod sweeps;

pub use gossip::{GossipAnnouncer, GossipHandler, GossipOutcome, WantedBlocks};
pub use ingestion::{publish_finalization, BlockIngestion, IngestReport};
pub use sweeps::{punish_equivocations, sweep_finalizations, sweep_forks};
