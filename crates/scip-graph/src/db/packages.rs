//! Package aggregation.

use std::collections::HashMap;

use rusqlite::params;

use super::Store;
use super::helpers::{PACKAGES_COLUMNS, row_to_package};
use crate::error::Result;
use crate::symbol::PackageRef;
use crate::types::Package;

/// Manager recorded for a package no identifier described.
const UNKNOWN_MANAGER: &str = "unknown";

impl Store {
    /// Stored package rows and distinct package names referenced by symbols.
    ///
    /// When the two agree and nothing changed, a rebuild can be skipped.
    pub fn package_counts(&self) -> Result<(u64, u64)> {
        let conn = self.connection()?;
        let stored: i64 = conn.query_row("SELECT COUNT(*) FROM packages", [], |row| row.get(0))?;
        let distinct: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT package) FROM symbols WHERE package IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok((
            u64::try_from(stored).unwrap_or(0),
            u64::try_from(distinct).unwrap_or(0),
        ))
    }

    /// Rebuild the packages table from the symbols table.
    ///
    /// `refs` supplies the manager and first-seen version per package name.
    /// Returns the number of packages written.
    pub fn rebuild_packages(&self, refs: &HashMap<String, PackageRef>) -> Result<usize> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        let mut written = 0;
        {
            tx.execute("DELETE FROM packages", [])?;

            let mut counts = tx.prepare(
                "SELECT package, COUNT(*) FROM symbols
                 WHERE package IS NOT NULL
                 GROUP BY package
                 ORDER BY package",
            )?;
            let rows = counts
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut insert = tx.prepare(
                "INSERT INTO packages (name, manager, version, symbol_count) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (name, count) in rows {
                let package = refs.get(&name);
                insert.execute(params![
                    name,
                    package.map_or(UNKNOWN_MANAGER, |p| p.manager.as_str()),
                    package.and_then(|p| p.version.as_deref()),
                    count
                ])?;
                written += 1;
            }
        }
        tx.commit()?;

        tracing::debug!(packages = written, "Rebuilt packages");
        Ok(written)
    }

    /// All packages, largest first.
    pub fn list_packages(&self) -> Result<Vec<Package>> {
        let conn = self.connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {PACKAGES_COLUMNS} FROM packages ORDER BY symbol_count DESC, name"
        ))?;

        let packages = stmt
            .query_map([], row_to_package)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(packages)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{file, symbol, temp_db};
    use super::*;

    #[test]
    fn rebuild_groups_symbols_by_package() {
        let (_dir, path) = temp_db();
        let store = Store::open(&path).unwrap();

        let mut react_a = symbol("useState", "s react a");
        react_a.package = Some("react".into());
        let mut react_b = symbol("useEffect", "s react b");
        react_b.package = Some("react".into());
        let mut orphan = symbol("Thing", "s orphan");
        orphan.package = Some("mystery".into());
        store
            .write_files(&[file("a.ts", vec![react_a, react_b, orphan, symbol("X", "s x")])], 1)
            .unwrap();

        let refs = HashMap::from([(
            "react".to_string(),
            PackageRef {
                manager: "npm".into(),
                name: "react".into(),
                version: Some("18.2.0".into()),
            },
        )]);

        assert_eq!(store.package_counts().unwrap(), (0, 2));
        let written = store.rebuild_packages(&refs).unwrap();
        assert_eq!(written, 2);
        assert_eq!(store.package_counts().unwrap(), (2, 2));

        let packages = store.list_packages().unwrap();
        assert_eq!(packages[0].name, "react");
        assert_eq!(packages[0].manager, "npm");
        assert_eq!(packages[0].version.as_deref(), Some("18.2.0"));
        assert_eq!(packages[0].symbol_count, 2);
        assert_eq!(packages[1].name, "mystery");
        assert_eq!(packages[1].manager, "unknown");
        assert_eq!(packages[1].version, None);
    }
}
