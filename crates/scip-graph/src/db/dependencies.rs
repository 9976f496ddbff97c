//! File-to-file dependency edges.

use rusqlite::params;

use super::Store;
use super::helpers::{DEPENDENCIES_COLUMNS, row_to_dependency};
use crate::error::{Error, Result};
use crate::types::{Dependency, FileId};

/// An edge ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRecord {
    /// The file doing the referencing
    pub from: FileId,
    /// The file defining the referenced symbols
    pub to: FileId,
    /// Sorted, distinct symbol names justifying the edge
    pub symbols: Vec<String>,
}

impl Store {
    /// Replace the outgoing edges of `sources` with `edges` in one transaction.
    ///
    /// Every file in `sources` loses its existing outgoing edges, even if
    /// `edges` has none for it. Self-edges are skipped.
    pub fn replace_dependencies(&self, sources: &[FileId], edges: &[DependencyRecord]) -> Result<usize> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        let mut written = 0;
        {
            let mut delete = tx.prepare("DELETE FROM dependencies WHERE from_file_id = ?1")?;
            for source in sources {
                delete.execute([source.as_i64()])?;
            }

            let mut insert = tx.prepare(
                "INSERT INTO dependencies (from_file_id, to_file_id, symbol_count, symbols)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(from_file_id, to_file_id) DO UPDATE SET
                    symbol_count = excluded.symbol_count,
                    symbols = excluded.symbols",
            )?;
            for edge in edges {
                if edge.from == edge.to {
                    continue;
                }
                let names = serde_json::to_string(&edge.symbols)
                    .map_err(|e| Error::Internal(format!("failed to encode symbol names: {e}")))?;
                // usize length fits in i64 on all supported platforms
                #[allow(clippy::cast_possible_wrap)]
                let count = edge.symbols.len() as i64;
                insert.execute(params![edge.from.as_i64(), edge.to.as_i64(), count, names])?;
                written += 1;
            }
        }
        tx.commit()?;

        tracing::debug!(sources = sources.len(), edges = written, "Replaced dependencies");
        Ok(written)
    }

    /// Outgoing edges of a file, ordered by target.
    pub fn dependencies_from(&self, file_id: FileId) -> Result<Vec<Dependency>> {
        let conn = self.connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {DEPENDENCIES_COLUMNS} FROM dependencies WHERE from_file_id = ?1
             ORDER BY to_file_id"
        ))?;

        let deps = stmt
            .query_map([file_id.as_i64()], row_to_dependency)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(deps)
    }

    /// Incoming edges of a file, ordered by source.
    pub fn dependencies_to(&self, file_id: FileId) -> Result<Vec<Dependency>> {
        let conn = self.connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {DEPENDENCIES_COLUMNS} FROM dependencies WHERE to_file_id = ?1
             ORDER BY from_file_id"
        ))?;

        let deps = stmt
            .query_map([file_id.as_i64()], row_to_dependency)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(deps)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{file, temp_db};
    use super::*;

    #[test]
    fn replace_dependencies_overwrites_previous_edges() {
        let (_dir, path) = temp_db();
        let store = Store::open(&path).unwrap();
        store
            .write_files(&[file("a.ts", vec![]), file("b.ts", vec![]), file("c.ts", vec![])], 1)
            .unwrap();
        let ids = store.file_ids().unwrap();
        let (a, b, c) = (ids["a.ts"], ids["b.ts"], ids["c.ts"]);

        store
            .replace_dependencies(
                &[a],
                &[DependencyRecord {
                    from: a,
                    to: b,
                    symbols: vec!["B".into()],
                }],
            )
            .unwrap();
        store
            .replace_dependencies(
                &[a],
                &[DependencyRecord {
                    from: a,
                    to: c,
                    symbols: vec!["C1".into(), "C2".into()],
                }],
            )
            .unwrap();

        let deps = store.dependencies_from(a).unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].to_file_id, c);
        assert_eq!(deps[0].symbol_count, 2);
        assert_eq!(deps[0].symbols, vec!["C1", "C2"]);
        assert_eq!(store.dependencies_to(c).unwrap().len(), 1);
        assert!(store.dependencies_to(b).unwrap().is_empty());
    }

    #[test]
    fn self_edges_are_never_written() {
        let (_dir, path) = temp_db();
        let store = Store::open(&path).unwrap();
        store.write_files(&[file("a.ts", vec![])], 1).unwrap();
        let a = store.file_ids().unwrap()["a.ts"];

        let written = store
            .replace_dependencies(
                &[a],
                &[DependencyRecord {
                    from: a,
                    to: a,
                    symbols: vec!["A".into()],
                }],
            )
            .unwrap();

        assert_eq!(written, 0);
        assert!(store.dependencies_from(a).unwrap().is_empty());
    }
}
