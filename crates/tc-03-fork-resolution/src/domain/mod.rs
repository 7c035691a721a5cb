//! Domain layer for fork resolution.

pub mod chain;
pub mod fork;
pub mod score;

pub use chain::Chain;
pub use fork::{ForkInfo, ForkStats, ForkStatus};
pub use score::{elect, ChainScore, Election, ResolutionRule, SCORE_EPSILON};
