//! Domain layer for mining.

pub mod candidate;
pub mod miner;

pub use candidate::{Candidate, CandidateBuilder};
pub use miner::{MiningJob, ProofOfWorkMiner};
