//! `SQLite` storage layer for the dependency graph.
//!
//! `SQLite` is the source of truth for every converted index. The conversion
//! pipeline is the only writer and goes through [`Store`]; the query engine
//! opens the same file through [`ReadOnlyConnection`], which `SQLite` itself
//! prevents from writing.
//!
//! ## Module Structure
//!
//! - `schema` - Database schema (DDL)
//! - `helpers` - Row conversion and parsing utilities
//! - `files` - File rows, batched document writes, deletions
//! - `symbols` - Symbol queries and the identifier index
//! - `dependencies` - File-to-file edges
//! - `references` - Symbol usage rows
//! - `counters` - Denormalized counter maintenance
//! - `packages` - Package aggregation
//! - `metadata` - Run metadata
//! - `readonly` - Read-only handle used by the query engine

mod counters;
mod dependencies;
mod files;
mod helpers;
pub mod metadata;
mod packages;
mod readonly;
mod references;
mod schema;
mod symbols;

pub use dependencies::DependencyRecord;
pub use files::{FileRecord, SymbolRecord};
pub use readonly::ReadOnlyConnection;
pub use references::ReferenceRecord;

pub(crate) use helpers::{FILES_COLUMNS, row_to_indexed_file};
pub(crate) use readonly::map_read_only_error;
pub(crate) use schema::SCHEMA;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::Connection;
use serde::Serialize;

use crate::error::{Error, Result};

/// Row totals across the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreTotals {
    /// Rows in `files`
    pub files: u64,
    /// Rows in `symbols`
    pub symbols: u64,
    /// Rows in `dependencies`
    pub dependencies: u64,
    /// Rows in `symbol_references`
    pub references: u64,
    /// Rows in `packages`
    pub packages: u64,
}

/// Journal settings for a write phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Durability {
    /// `synchronous = OFF`, `journal_mode = MEMORY`
    Relaxed,
    /// `journal_mode = DELETE`, `synchronous = FULL`
    Durable,
}

/// Read-write `SQLite` handle for the graph store.
///
/// The connection is wrapped in a `Mutex` so the store can be shared by
/// reference while writes stay serialized.
pub struct Store {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl Store {
    /// Open or create the store, applying the schema.
    ///
    /// Any failure to open, configure, or migrate the file is reported as
    /// [`Error::StoreOpen`].
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let store_open = |source: rusqlite::Error| Error::StoreOpen {
            path: path.to_path_buf(),
            source,
        };

        let conn = Connection::open(path).map_err(store_open)?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(store_open)?;
        apply_durability(&conn, Durability::Durable).map_err(store_open)?;
        conn.execute_batch(SCHEMA).map_err(store_open)?;

        tracing::debug!(path = %path.display(), "Opened store");

        Ok(Self {
            conn: Mutex::new(conn),
            path: path.to_path_buf(),
        })
    }

    /// Location of the store on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Acquire the connection lock.
    ///
    /// Returns a `MutexGuard` providing exclusive access to the underlying connection.
    /// Used internally by all database operations.
    pub(crate) fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            Error::Internal(format!(
                "database connection mutex poisoned (a thread panicked while holding the lock): {e}"
            ))
        })
    }

    /// Get the current unix timestamp in nanoseconds.
    // u128 nanoseconds won't exceed i64::MAX until year 2262
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub(crate) fn now_ns() -> Result<i64> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as i64)
            .map_err(|e| {
                Error::Config(format!(
                    "System clock is before Unix epoch: {e}. Fix system time before converting."
                ))
            })
    }

    /// Run `f` with relaxed journaling, then restore durable settings.
    ///
    /// Durable settings are restored whether or not `f` succeeds. If both `f`
    /// and the restore fail, the error from `f` is returned.
    pub fn with_relaxed_durability<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        {
            let conn = self.connection()?;
            apply_durability(&conn, Durability::Relaxed)?;
        }
        tracing::debug!("Relaxed durability for bulk writes");

        let result = f(self);

        let restored = self
            .connection()
            .and_then(|conn| apply_durability(&conn, Durability::Durable).map_err(Error::from));
        match (&result, restored) {
            (_, Ok(())) => tracing::debug!("Restored durable settings"),
            (Ok(_), Err(e)) => return Err(e),
            (Err(_), Err(e)) => {
                tracing::error!(error = %e, "Failed to restore durable settings after error");
            }
        }

        result
    }

    /// Remove every row from every table in one transaction.
    pub fn clear_all(&self) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        tx.execute_batch(
            "DELETE FROM symbol_references;
             DELETE FROM dependencies;
             DELETE FROM symbols;
             DELETE FROM packages;
             DELETE FROM files;
             DELETE FROM metadata;",
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Row totals across all tables.
    pub fn totals(&self) -> Result<StoreTotals> {
        let conn = self.connection()?;
        totals(&conn)
    }

    /// Update `SQLite` query planner statistics.
    ///
    /// Should be called after bulk data changes (full rebuild) so the query
    /// planner can make better index-selection decisions. Not needed after
    /// small incremental updates.
    pub fn analyze(&self) -> Result<()> {
        let conn = self.connection()?;

        conn.execute_batch("ANALYZE")?;
        Ok(())
    }
}

fn apply_durability(conn: &Connection, durability: Durability) -> rusqlite::Result<()> {
    match durability {
        Durability::Relaxed => {
            conn.pragma_update(None, "synchronous", "OFF")?;
            conn.pragma_update(None, "journal_mode", "MEMORY")?;
        }
        Durability::Durable => {
            conn.pragma_update(None, "journal_mode", "DELETE")?;
            conn.pragma_update(None, "synchronous", "FULL")?;
        }
    }
    Ok(())
}

// Counts are never negative.
#[allow(clippy::cast_sign_loss)]
pub(crate) fn totals(conn: &Connection) -> Result<StoreTotals> {
    let count = |table: &str| -> Result<u64> {
        let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })?;
        Ok(n as u64)
    };

    Ok(StoreTotals {
        files: count("files")?,
        symbols: count("symbols")?,
        dependencies: count("dependencies")?,
        references: count("symbol_references")?,
        packages: count("packages")?,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::types::{Span, SymbolKind};
    use tempfile::TempDir;

    pub(crate) fn temp_db() -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("should create temp directory");
        let path = dir.path().join("graph.db");
        (dir, path)
    }

    pub(crate) fn symbol(name: &str, scip_symbol: &str) -> SymbolRecord {
        SymbolRecord {
            name: name.to_string(),
            scip_symbol: scip_symbol.to_string(),
            kind: SymbolKind::Class,
            span: Span {
                start_line: 0,
                start_char: 0,
                end_line: 0,
                end_char: 3,
            },
            documentation: None,
            package: None,
            is_local: false,
        }
    }

    pub(crate) fn file(path: &str, symbols: Vec<SymbolRecord>) -> FileRecord {
        FileRecord {
            path: path.to_string(),
            language: "typescript".to_string(),
            mtime: 1_000,
            symbols,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{file, symbol, temp_db};
    use super::*;

    fn journal_mode(store: &Store) -> String {
        let conn = store.connection().unwrap();
        conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn open_creates_database_and_schema() {
        let (_dir, path) = temp_db();

        let store = Store::open(&path).expect("failed to open database");
        let conn = store.connection().expect("should get connection");

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        for table in [
            "dependencies",
            "files",
            "metadata",
            "packages",
            "symbol_references",
            "symbols",
        ] {
            assert!(tables.contains(&table.to_string()), "missing table {table}");
        }
    }

    #[test]
    fn open_creates_missing_parent_directories() {
        let (dir, _) = temp_db();
        let nested = dir.path().join("a/b/graph.db");

        Store::open(&nested).expect("should create parents");
        assert!(nested.exists());
    }

    #[test]
    fn open_reports_store_open_for_non_database_file() {
        let (dir, _) = temp_db();
        let bogus = dir.path().join("bogus.db");
        std::fs::write(&bogus, b"this is definitely not an sqlite database file").unwrap();

        let err = Store::open(&bogus).err().expect("open should fail");
        assert!(matches!(err, Error::StoreOpen { .. }), "got {err:?}");
    }

    #[test]
    fn relaxed_durability_is_restored_after_success() {
        let (_dir, path) = temp_db();
        let store = Store::open(&path).unwrap();

        let inside = store
            .with_relaxed_durability(|s| Ok(journal_mode(s)))
            .unwrap();

        assert_eq!(inside.to_lowercase(), "memory");
        assert_eq!(journal_mode(&store).to_lowercase(), "delete");
    }

    #[test]
    fn relaxed_durability_is_restored_after_error() {
        let (_dir, path) = temp_db();
        let store = Store::open(&path).unwrap();

        let result: Result<()> =
            store.with_relaxed_durability(|_| Err(Error::Internal("boom".into())));

        assert!(matches!(result, Err(Error::Internal(_))));
        assert_eq!(journal_mode(&store).to_lowercase(), "delete");
    }

    #[test]
    fn clear_all_empties_every_table() {
        let (_dir, path) = temp_db();
        let store = Store::open(&path).unwrap();
        store
            .write_files(&[file("a.ts", vec![symbol("A", "s a")])], 1)
            .unwrap();
        store.set_metadata(&[("total_files", "1".to_string())]).unwrap();

        store.clear_all().unwrap();

        assert_eq!(store.totals().unwrap(), StoreTotals::default());
        assert_eq!(store.get_metadata("total_files").unwrap(), None);
    }

    #[test]
    fn totals_counts_rows() {
        let (_dir, path) = temp_db();
        let store = Store::open(&path).unwrap();
        store
            .write_files(
                &[
                    file("a.ts", vec![symbol("A", "s a"), symbol("B", "s b")]),
                    file("b.ts", vec![]),
                ],
                1,
            )
            .unwrap();

        let totals = store.totals().unwrap();
        assert_eq!(totals.files, 2);
        assert_eq!(totals.symbols, 2);
        assert_eq!(totals.dependencies, 0);
    }
}
