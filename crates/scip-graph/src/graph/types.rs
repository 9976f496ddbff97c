//! Result types for graph queries.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::db::StoreTotals;
use crate::error::QueryError;

/// A file reached by a traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReachableFile {
    /// Stored relative path
    pub path: String,
    /// Minimum number of hops from the start file
    pub depth: u32,
}

/// A shortest dependency path between two files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyPath {
    /// Files from source to target, both included
    pub files: Vec<String>,
    /// Number of edges on the path
    pub distance: u32,
}

impl DependencyPath {
    /// Trivial path from a file to itself.
    #[must_use]
    pub fn single(path: String) -> Self {
        Self {
            files: vec![path],
            distance: 0,
        }
    }

    /// Build a path from its files. Returns `None` if `files` is empty.
    #[must_use]
    pub fn new(files: Vec<String>) -> Option<Self> {
        let hops = files.len().checked_sub(1)?;
        Some(Self {
            distance: u32::try_from(hops).unwrap_or(u32::MAX),
            files,
        })
    }
}

/// A two-node dependency cycle, reported as `[a, b, a]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cycle {
    /// Files around the cycle, first repeated at the end
    pub files: Vec<String>,
    /// Number of distinct files in the cycle
    pub length: usize,
}

impl Cycle {
    /// Cycle between two files.
    #[must_use]
    pub fn pair(a: String, b: String) -> Self {
        Self {
            files: vec![a.clone(), b, a],
            length: 2,
        }
    }
}

/// Two files that depend on each other, with edge weights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoupledPair {
    /// Lexicographically smaller path
    pub file_a: String,
    /// Lexicographically larger path
    pub file_b: String,
    /// Symbols `file_a` uses from `file_b`
    pub a_to_b: u64,
    /// Symbols `file_b` uses from `file_a`
    pub b_to_a: u64,
    /// `a_to_b + b_to_a`
    pub total: u64,
}

/// Structural metrics for one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileComplexity {
    /// Stored relative path
    pub path: String,
    /// Symbols defined in the file
    pub symbol_count: u64,
    /// Files this file depends on
    pub outgoing: u64,
    /// Files depending on this file
    pub incoming: u64,
    /// `incoming / (incoming + outgoing)`, 0 for isolated files
    pub stability: f64,
    /// `symbol_count + 2 * outgoing + incoming`
    pub score: u64,
}

impl FileComplexity {
    /// Derive stability and score from the raw counts.
    #[must_use]
    pub fn new(path: String, symbol_count: u64, outgoing: u64, incoming: u64) -> Self {
        Self {
            path,
            symbol_count,
            outgoing,
            incoming,
            stability: stability(incoming, outgoing),
            score: symbol_count
                .saturating_add(outgoing.saturating_mul(2))
                .saturating_add(incoming),
        }
    }
}

/// Fraction of a file's edges that point at it.
#[must_use]
#[allow(clippy::cast_precision_loss)] // Edge counts stay far below 2^52
pub fn stability(incoming: u64, outgoing: u64) -> f64 {
    let total = incoming.saturating_add(outgoing);
    if total == 0 {
        0.0
    } else {
        incoming as f64 / total as f64
    }
}

/// Ordering for [`complexity`](super::FileGraphOps::complexity) results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexitySort {
    /// Highest score first
    #[default]
    Complexity,
    /// Most symbols first
    Symbols,
    /// Most stable first
    Stability,
}

impl std::str::FromStr for ComplexitySort {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "complexity" => Ok(Self::Complexity),
            "symbols" => Ok(Self::Symbols),
            "stability" => Ok(Self::Stability),
            other => Err(QueryError::InvalidArgument(format!(
                "unknown sort '{other}' (expected complexity, symbols, or stability)"
            ))),
        }
    }
}

/// A file few others depend on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeafFile {
    /// Stored relative path
    pub path: String,
    /// Files depending on this one
    pub dependent_count: u64,
    /// Symbols defined in the file
    pub symbol_count: u64,
}

/// Run metadata and table totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexSummary {
    /// Metadata written by the last run
    pub metadata: BTreeMap<String, String>,
    /// Row counts per table
    pub totals: StoreTotals,
}

/// Result of an ad hoc query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryRows {
    /// Column names in select order
    pub columns: Vec<String>,
    /// One JSON value per column per row
    pub rows: Vec<Vec<serde_json::Value>>,
}
