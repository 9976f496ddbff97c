//! CLI command implementations.

mod display;

pub mod complexity;
pub mod coupling;
pub mod cycles;
pub mod deps;
pub mod index;
pub mod leaves;
pub mod path;
pub mod query;
pub mod summary;

pub use display::print_error_hints;

use std::path::{Path, PathBuf};

use scip_graph::graph::SqlFileGraph;

/// Settings shared by every command.
pub struct Context {
    /// Project root
    pub project: PathBuf,
    /// Store location
    pub db: PathBuf,
    /// Emit JSON instead of colored text
    pub json: bool,
}

impl Context {
    /// Open the store for querying.
    pub fn graph(&self) -> Result<SqlFileGraph, scip_graph::Error> {
        Ok(SqlFileGraph::open(&self.db)?.with_project_root(self.project.as_path()))
    }

    /// Project root as a path.
    pub fn project(&self) -> &Path {
        &self.project
    }
}
