//! # scip-graph: SCIP Index to Dependency Graph
//!
//! scip-graph turns a SCIP code-intelligence index into a `SQLite` graph of
//! files, symbols, and cross-file dependencies, then answers structural
//! questions over it. It is designed for programmatic use by CLI tools and
//! AI agents that need "what depends on what" without re-parsing source.
//!
//! ## Design Philosophy
//!
//! - **Convert once, query often** - The indexer does the semantic work; this crate stores its answers
//! - **Incremental by default** - Only new and modified files are reconverted
//! - **Read-only queries** - The query engine cannot modify the store, even through ad hoc SQL
//! - **Intelligence, not policy** - Reports facts ("12 dependents"), not judgments ("too risky")
//!
//! ## Quick Start
//!
//! ```no_run
//! use scip_graph::graph::{FileGraphOps, SqlFileGraph};
//! use scip_graph::pipeline::{ConvertOptions, convert};
//! use std::path::Path;
//!
//! let project = Path::new("/path/to/project");
//! let db = project.join(".scip-graph/graph.db");
//!
//! // Convert the index
//! let stats = convert(&project.join("index.scip"), &db, project, &ConvertOptions::default())?;
//! println!("{} files, {} symbols ({})", stats.total_files, stats.total_symbols, stats.mode);
//!
//! // Query the graph
//! let graph = SqlFileGraph::open(&db)?;
//! for file in graph.dependents("src/auth.ts", 2)? {
//!     println!("{} (depth {})", file.path, file.depth);
//! }
//! # Ok::<(), scip_graph::Error>(())
//! ```

pub mod db;
mod error;
pub mod graph;
pub mod kind;
pub mod paths;
pub mod pipeline;
pub mod resolver;
pub mod scip;
pub mod symbol;
mod types;

pub use error::{DecodeError, DocumentError, DocumentErrorKind, Error, QueryError, Result};
pub use types::{
    Dependency, FileId, IndexedFile, Package, RunMode, RunStats, Span, Symbol, SymbolId,
    SymbolKind, SymbolReference, language_tag,
};

use std::path::{Path, PathBuf};

/// Directory, relative to the project root, holding the default store.
pub const STORE_DIR: &str = ".scip-graph";

/// File name of the default store.
pub const STORE_FILE: &str = "graph.db";

/// Default store location for a project: `<project>/.scip-graph/graph.db`.
#[must_use]
pub fn default_store_path(project_root: &Path) -> PathBuf {
    project_root.join(STORE_DIR).join(STORE_FILE)
}
