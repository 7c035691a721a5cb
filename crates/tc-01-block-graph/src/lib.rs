//! # Block Graph (tc-01)
//!
//! The block DAG: every produced block, its parent edges, and the set of open
//! tips. This crate exclusively owns block storage; fork resolution and
//! consensus read it through [`shared_types::BlockLookup`].
//!
//! ## Domain Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Tip | A hash is a tip iff no stored block lists it as a parent |
//! | Idempotent insert | Re-inserting a stored hash is a no-op returning `false` |
//! | Orphan tolerance | Blocks with unknown parents are accepted |
//! | Narrow lock | The exclusive lock covers the in-memory insert only |
//!
//! The graph validates nothing: PoW and signatures are the miner's and the
//! validators' concern.
//!
//! ## Crate Structure
//!
//! - `domain/` - the lock-free DAG index, stats and errors
//! - `service.rs` - [`BlockGraph`], the shared, locked, optionally persistent store

pub mod domain;
pub mod service;

pub use domain::{DagIndex, GraphError, GraphResult, GraphStats};
pub use service::{BlockGraph, BLOCK_KEY_PREFIX};
