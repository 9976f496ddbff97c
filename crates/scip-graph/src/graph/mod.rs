//! Graph queries over the store.
//!
//! - Traversal: what a file depends on, what depends on it, within `d` hops
//! - Path finding: shortest dependency chain between two files
//! - Structure: two-node cycles, coupling, complexity, leaf files
//!
//! ## Design
//!
//! - [`FileGraphOps`] defines the operations; [`SqlFileGraph`] answers them
//!   with recursive CTEs on a read-only connection
//! - Files are addressed by path; arguments are resolved through
//!   [`crate::paths::resolve`] so typos surface as [`QueryError`]s with
//!   suggestions
//!
//! [`QueryError`]: crate::error::QueryError

mod sql;
mod types;

pub use sql::{MAX_PATH_DEPTH, SqlFileGraph, is_config_file, is_test_file};
pub use types::{
    ComplexitySort, CoupledPair, Cycle, DependencyPath, FileComplexity, IndexSummary, LeafFile,
    QueryRows, ReachableFile, stability,
};

use crate::error::Result;

/// Read-only operations on the file dependency graph.
pub trait FileGraphOps: Send + Sync {
    /// Files `path` depends on within `depth` hops (≥ 1), nearest first.
    fn dependencies(&self, path: &str, depth: u32) -> Result<Vec<ReachableFile>>;

    /// Files depending on `path` within `depth` hops (≥ 1), nearest first.
    fn dependents(&self, path: &str, depth: u32) -> Result<Vec<ReachableFile>>;

    /// Shortest dependency chain from `from` to `to`.
    fn find_path(&self, from: &str, to: &str) -> Result<DependencyPath>;

    /// Pairs of files that depend on each other, at most `limit` (≥ 1).
    fn two_node_cycles(&self, limit: usize) -> Result<Vec<Cycle>>;

    /// Mutually dependent pairs whose combined symbol count reaches `threshold`.
    fn coupling(&self, threshold: u64) -> Result<Vec<CoupledPair>>;

    /// Per-file metrics, sorted descending by `sort`, at most `limit` (≥ 1).
    fn complexity(&self, sort: ComplexitySort, limit: usize) -> Result<Vec<FileComplexity>>;

    /// Non-test, non-config files with at most `max_dependents` dependents.
    fn leaves(&self, max_dependents: u64) -> Result<Vec<LeafFile>>;

    /// Run metadata and table totals.
    fn summary(&self) -> Result<IndexSummary>;

    /// Run a read-only SQL statement.
    fn query(&self, sql: &str) -> Result<QueryRows>;
}
