//! # Task Wiring
//!
//! Long-running work owned by the runtime:
//!
//! ```text
//!                 ┌──────────────── watch<bool> shutdown ────────────────┐
//!                 ▼                    ▼                 ▼               ▼
//!  mining threads ──MinedBlock──▶ block consumer ──▶ ingestion    fork sweep
//!                                      │                         finalize sweep
//!                                      └──NewBlock──▶ outbound ◀── heartbeat
//!  inbound gossip ──▶ gossip listener ──▶ GossipHandler
//! ```
//!
//! Every task exits on the first shutdown signal; mining threads stop on
//! their own flag.

pub mod mining;
pub mod scheduled_tasks;

pub use mining::{spawn_block_consumer, start_mining};
pub use scheduled_tasks::{
    spawn_finalization_sweep, spawn_fork_sweep, spawn_gossip_listener, spawn_heartbeat,
};
