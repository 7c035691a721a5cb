//! Domain layer for the validator set and block voting.

pub mod error;
pub mod ledger;
pub mod validator;
pub mod votes;

pub use error::{ConsensusError, ConsensusResult};
pub use ledger::{LedgerEffect, StakeLedger};
pub use validator::{Reputation, Validator, ValidatorId};
pub use votes::{has_quorum, BlockStatus, BlockVotes, Equivocation, Recorded, Vote};
