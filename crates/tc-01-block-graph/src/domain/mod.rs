//! Domain layer for the block graph.

pub mod dag;
pub mod errors;

pub use dag::{DagIndex, GraphStats};
pub use errors::{GraphError, GraphResult};
