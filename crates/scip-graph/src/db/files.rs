//! File rows and batched document writes.

use std::collections::{BTreeSet, HashMap};

use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, warn};

use super::{FILES_COLUMNS, Store, row_to_indexed_file};
use crate::error::{DocumentError, Result};
use crate::types::{FileId, IndexedFile, Span, SymbolKind};

/// A symbol definition ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRecord {
    /// Display name
    pub name: String,
    /// Raw SCIP identifier
    pub scip_symbol: String,
    /// Coarse kind
    pub kind: SymbolKind,
    /// Definition range
    pub span: Span,
    /// Joined documentation lines
    pub documentation: Option<String>,
    /// Owning package name
    pub package: Option<String>,
    /// Document-local symbol
    pub is_local: bool,
}

/// A document ready to be written: its file row and its definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Path relative to the project root
    pub path: String,
    /// Lowercase language tag
    pub language: String,
    /// On-disk modification time in nanoseconds (0 if absent)
    pub mtime: i64,
    /// Definitions in occurrence order
    pub symbols: Vec<SymbolRecord>,
}

impl Store {
    /// Number of files in the store.
    pub fn file_count(&self) -> Result<u64> {
        let conn = self.connection()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Get a file by path.
    pub fn get_file(&self, path: &str) -> Result<Option<IndexedFile>> {
        let conn = self.connection()?;

        conn.query_row(
            &format!("SELECT {FILES_COLUMNS} FROM files WHERE path = ?1"),
            [path],
            row_to_indexed_file,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Get all files, ordered by path.
    pub fn list_files(&self) -> Result<Vec<IndexedFile>> {
        let conn = self.connection()?;

        let mut stmt = conn.prepare(&format!("SELECT {FILES_COLUMNS} FROM files ORDER BY path"))?;

        let files = stmt
            .query_map([], row_to_indexed_file)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(files)
    }

    /// Stored modification time for every file, keyed by path.
    pub fn file_mtimes(&self) -> Result<HashMap<String, i64>> {
        let conn = self.connection()?;

        let mut stmt = conn.prepare("SELECT path, mtime FROM files")?;
        let mtimes = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<HashMap<_, _>, _>>()?;

        Ok(mtimes)
    }

    /// Every file ID, keyed by path.
    pub fn file_ids(&self) -> Result<HashMap<String, FileId>> {
        let conn = self.connection()?;

        let mut stmt = conn.prepare("SELECT path, id FROM files")?;
        let ids = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, FileId::from(row.get::<_, i64>(1)?)))
            })?
            .collect::<std::result::Result<HashMap<_, _>, _>>()?;

        Ok(ids)
    }

    /// Paths of files with an edge into any of `paths`.
    ///
    /// Only direct dependents are returned.
    pub fn dependents_of(&self, paths: &[String]) -> Result<BTreeSet<String>> {
        let conn = self.connection()?;

        let mut stmt = conn.prepare(
            "SELECT DISTINCT src.path
             FROM dependencies d
             JOIN files src ON src.id = d.from_file_id
             JOIN files dst ON dst.id = d.to_file_id
             WHERE dst.path = ?1",
        )?;

        let mut dependents = BTreeSet::new();
        for path in paths {
            let rows = stmt.query_map([path], |row| row.get::<_, String>(0))?;
            for row in rows {
                dependents.insert(row?);
            }
        }

        Ok(dependents)
    }

    /// Delete files by path in one transaction.
    ///
    /// Symbols, edges and usage rows of the deleted files go with them.
    /// Returns the number of file rows removed.
    pub fn delete_files(&self, paths: &[String]) -> Result<usize> {
        if paths.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        let mut deleted = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM files WHERE path = ?1")?;
            for path in paths {
                deleted += stmt.execute([path])?;
            }
        }
        tx.commit()?;

        debug!(requested = paths.len(), deleted, "Deleted files");
        Ok(deleted)
    }

    /// Write a batch of documents in one transaction.
    ///
    /// Each document gets its own savepoint: a document that fails is rolled
    /// back and reported, and the rest of the batch is still committed.
    /// An existing row for the same path is replaced.
    pub fn write_files(&self, records: &[FileRecord], indexed_at: i64) -> Result<Vec<DocumentError>> {
        let mut conn = self.connection()?;
        let mut tx = conn.transaction()?;
        let mut errors = Vec::new();

        for record in records {
            let sp = tx.savepoint()?;
            match write_file(&sp, record, indexed_at) {
                Ok(()) => sp.commit()?,
                Err(e) => {
                    warn!(
                        path = %record.path,
                        error = %e,
                        "Failed to write document, skipping"
                    );
                    errors.push(DocumentError::database(&record.path, &e));
                    // Dropping the savepoint rolls it back.
                }
            }
        }

        tx.commit()?;
        Ok(errors)
    }
}

fn write_file(conn: &Connection, record: &FileRecord, indexed_at: i64) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM files WHERE path = ?1", [&record.path])?;
    conn.execute(
        "INSERT INTO files (path, language, mtime, indexed_at) VALUES (?1, ?2, ?3, ?4)",
        params![record.path, record.language, record.mtime, indexed_at],
    )?;
    let file_id = conn.last_insert_rowid();

    let mut stmt = conn.prepare_cached(
        "INSERT INTO symbols (file_id, name, scip_symbol, kind, start_line, end_line,
         start_char, end_char, documentation, package, is_local)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    )?;
    for sym in &record.symbols {
        stmt.execute(params![
            file_id,
            sym.name,
            sym.scip_symbol,
            sym.kind.as_str(),
            sym.span.start_line,
            sym.span.end_line,
            sym.span.start_char,
            sym.span.end_char,
            sym.documentation,
            sym.package,
            sym.is_local,
        ])?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{file, symbol, temp_db};
    use super::*;
    use crate::db::DependencyRecord;

    #[test]
    fn write_files_inserts_files_and_symbols() {
        let (_dir, path) = temp_db();
        let store = Store::open(&path).unwrap();

        let errors = store
            .write_files(
                &[file("src/a.ts", vec![symbol("A", "s a"), symbol("B", "s b")])],
                42,
            )
            .unwrap();
        assert!(errors.is_empty());

        let stored = store.get_file("src/a.ts").unwrap().expect("file should exist");
        assert_eq!(stored.language, "typescript");
        assert_eq!(stored.mtime, 1_000);
        assert_eq!(stored.indexed_at, 42);

        let symbols = store.symbols_in_file(stored.id).unwrap();
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].name, "A");
        assert_eq!(symbols[1].name, "B");
    }

    #[test]
    fn rewriting_a_path_replaces_its_row() {
        let (_dir, path) = temp_db();
        let store = Store::open(&path).unwrap();

        store
            .write_files(&[file("a.ts", vec![symbol("Old", "s old")])], 1)
            .unwrap();
        store
            .write_files(&[file("a.ts", vec![symbol("New", "s new")])], 2)
            .unwrap();

        assert_eq!(store.file_count().unwrap(), 1);
        let stored = store.get_file("a.ts").unwrap().unwrap();
        let names: Vec<_> = store
            .symbols_in_file(stored.id)
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["New"]);
    }

    #[test]
    fn failing_document_is_rolled_back_and_reported() {
        let (_dir, path) = temp_db();
        let store = Store::open(&path).unwrap();
        {
            // Make symbol inserts for one specific document fail.
            let conn = store.connection().unwrap();
            conn.execute_batch(
                "CREATE TRIGGER reject_bad BEFORE INSERT ON symbols
                 WHEN NEW.name = 'Bad'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();
        }

        let errors = store
            .write_files(
                &[
                    file("good.ts", vec![symbol("Good", "s good")]),
                    file("bad.ts", vec![symbol("Fine", "s fine"), symbol("Bad", "s bad")]),
                    file("later.ts", vec![]),
                ],
                1,
            )
            .unwrap();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "bad.ts");
        assert!(errors[0].kind.is_internal_error());

        assert!(store.get_file("good.ts").unwrap().is_some());
        assert!(store.get_file("later.ts").unwrap().is_some());
        assert!(
            store.get_file("bad.ts").unwrap().is_none(),
            "partially written document should be rolled back"
        );
        assert_eq!(store.totals().unwrap().symbols, 1);
    }

    #[test]
    fn delete_files_cascades_to_symbols_and_edges() {
        let (_dir, path) = temp_db();
        let store = Store::open(&path).unwrap();
        store
            .write_files(
                &[
                    file("a.ts", vec![symbol("A", "s a")]),
                    file("b.ts", vec![symbol("B", "s b")]),
                ],
                1,
            )
            .unwrap();
        let ids = store.file_ids().unwrap();
        store
            .replace_dependencies(
                &[ids["a.ts"]],
                &[DependencyRecord {
                    from: ids["a.ts"],
                    to: ids["b.ts"],
                    symbols: vec!["B".to_string()],
                }],
            )
            .unwrap();

        let deleted = store.delete_files(&["b.ts".to_string()]).unwrap();

        assert_eq!(deleted, 1);
        let totals = store.totals().unwrap();
        assert_eq!(totals.files, 1);
        assert_eq!(totals.symbols, 1);
        assert_eq!(totals.dependencies, 0);
    }

    #[test]
    fn dependents_of_returns_direct_dependents_only() {
        let (_dir, path) = temp_db();
        let store = Store::open(&path).unwrap();
        store
            .write_files(
                &[file("a.ts", vec![]), file("b.ts", vec![]), file("c.ts", vec![])],
                1,
            )
            .unwrap();
        let ids = store.file_ids().unwrap();
        let edge = |from: &str, to: &str| DependencyRecord {
            from: ids[from],
            to: ids[to],
            symbols: vec!["X".to_string()],
        };
        store
            .replace_dependencies(
                &[ids["a.ts"], ids["b.ts"]],
                &[edge("a.ts", "b.ts"), edge("b.ts", "c.ts")],
            )
            .unwrap();

        let dependents = store.dependents_of(&["c.ts".to_string()]).unwrap();
        assert_eq!(dependents.into_iter().collect::<Vec<_>>(), vec!["b.ts"]);
    }

    #[test]
    fn file_mtimes_reports_stored_values() {
        let (_dir, path) = temp_db();
        let store = Store::open(&path).unwrap();
        store.write_files(&[file("a.ts", vec![])], 1).unwrap();

        let mtimes = store.file_mtimes().unwrap();
        assert_eq!(mtimes.get("a.ts"), Some(&1_000));
    }
}
