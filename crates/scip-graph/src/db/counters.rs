//! Denormalized counter maintenance.
//!
//! `files.symbol_count`, `files.dependency_count`, `files.dependent_count` and
//! `symbols.reference_count` are always recomputed from the base tables, never
//! incremented, so they cannot drift.

use super::Store;
use crate::error::Result;

impl Store {
    /// Recompute every denormalized counter in one transaction.
    pub fn refresh_counters(&self) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        tx.execute_batch(
            "UPDATE files SET
                symbol_count = (SELECT COUNT(*) FROM symbols s WHERE s.file_id = files.id),
                dependency_count = (SELECT COUNT(*) FROM dependencies d WHERE d.from_file_id = files.id),
                dependent_count = (SELECT COUNT(*) FROM dependencies d WHERE d.to_file_id = files.id);
             UPDATE symbols SET
                reference_count = (SELECT COUNT(*) FROM symbol_references r WHERE r.symbol_id = symbols.id);",
        )?;
        tx.commit()?;

        tracing::debug!("Refreshed denormalized counters");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{file, symbol, temp_db};
    use crate::db::{DependencyRecord, ReferenceRecord, Store};

    #[test]
    fn counters_match_base_tables() {
        let (_dir, path) = temp_db();
        let store = Store::open(&path).unwrap();
        store
            .write_files(
                &[
                    file("a.ts", vec![symbol("A", "s a"), symbol("A2", "s a2")]),
                    file("b.ts", vec![]),
                    file("c.ts", vec![]),
                ],
                1,
            )
            .unwrap();
        let ids = store.file_ids().unwrap();
        let (a, b, c) = (ids["a.ts"], ids["b.ts"], ids["c.ts"]);
        let edge = |from, to| DependencyRecord {
            from,
            to,
            symbols: vec!["A".to_string()],
        };
        store
            .replace_dependencies(&[b, c], &[edge(b, a), edge(c, a), edge(c, b)])
            .unwrap();
        let symbol_id = store.symbol_index().unwrap()["s a"];
        store
            .replace_references(
                &[b, c],
                &[
                    ReferenceRecord { symbol_id, file_id: b, line: 1 },
                    ReferenceRecord { symbol_id, file_id: c, line: 7 },
                ],
            )
            .unwrap();

        store.refresh_counters().unwrap();

        let a_row = store.get_file("a.ts").unwrap().unwrap();
        assert_eq!(a_row.symbol_count, 2);
        assert_eq!(a_row.dependency_count, 0);
        assert_eq!(a_row.dependent_count, 2);

        let c_row = store.get_file("c.ts").unwrap().unwrap();
        assert_eq!(c_row.dependency_count, 2);
        assert_eq!(c_row.dependent_count, 0);

        let symbols = store.symbols_in_file(a).unwrap();
        let counts: Vec<_> = symbols.iter().map(|s| (s.name.as_str(), s.reference_count)).collect();
        assert_eq!(counts, vec![("A", 2), ("A2", 0)]);
    }
}
