//! Symbol usage rows.

use std::collections::BTreeSet;

use rusqlite::params;

use super::Store;
use super::helpers::{REFERENCES_COLUMNS, row_to_reference};
use crate::error::Result;
use crate::types::{FileId, SymbolId, SymbolReference};

/// A usage ready to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferenceRecord {
    /// The referenced symbol
    pub symbol_id: SymbolId,
    /// The file containing the usage
    pub file_id: FileId,
    /// 0-indexed line of the usage
    pub line: u32,
}

impl Store {
    /// Replace the usage rows of `files` with `references` in one transaction.
    ///
    /// Repeats of the same (symbol, file, line) triple collapse to one row.
    /// Returns the number of rows inserted.
    pub fn replace_references(&self, files: &[FileId], references: &[ReferenceRecord]) -> Result<usize> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut delete = tx.prepare("DELETE FROM symbol_references WHERE file_id = ?1")?;
            for file in files {
                delete.execute([file.as_i64()])?;
            }

            let mut insert = tx.prepare(
                "INSERT OR IGNORE INTO symbol_references (symbol_id, file_id, line)
                 VALUES (?1, ?2, ?3)",
            )?;
            for reference in references {
                inserted += insert.execute(params![
                    reference.symbol_id.as_i64(),
                    reference.file_id.as_i64(),
                    reference.line
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!(files = files.len(), inserted, "Replaced symbol references");
        Ok(inserted)
    }

    /// Usage rows recorded in a file, in line order.
    pub fn references_in_file(&self, file_id: FileId) -> Result<Vec<SymbolReference>> {
        let conn = self.connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {REFERENCES_COLUMNS} FROM symbol_references WHERE file_id = ?1
             ORDER BY line, symbol_id"
        ))?;

        let refs = stmt
            .query_map([file_id.as_i64()], row_to_reference)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(refs)
    }

    /// Usage rows of a symbol.
    pub fn references_to(&self, symbol_id: SymbolId) -> Result<Vec<SymbolReference>> {
        let conn = self.connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {REFERENCES_COLUMNS} FROM symbol_references WHERE symbol_id = ?1
             ORDER BY file_id, line"
        ))?;

        let refs = stmt
            .query_map([symbol_id.as_i64()], row_to_reference)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(refs)
    }

    /// Paths of files with usage rows pointing at symbols defined in `paths`.
    ///
    /// Unlike [`Store::dependents_of`], this also finds files whose usages
    /// never produced a dependency edge.
    pub fn referencing_files(&self, paths: &[String]) -> Result<BTreeSet<String>> {
        let conn = self.connection()?;

        let mut stmt = conn.prepare(
            "SELECT DISTINCT src.path
             FROM symbol_references r
             JOIN symbols s ON s.id = r.symbol_id
             JOIN files dst ON dst.id = s.file_id
             JOIN files src ON src.id = r.file_id
             WHERE dst.path = ?1",
        )?;

        let mut referencing = BTreeSet::new();
        for path in paths {
            let rows = stmt.query_map([path], |row| row.get::<_, String>(0))?;
            for row in rows {
                referencing.insert(row?);
            }
        }

        Ok(referencing)
    }
}
