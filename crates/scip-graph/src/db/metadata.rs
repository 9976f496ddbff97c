//! Run metadata key/value pairs.

use std::collections::BTreeMap;

use rusqlite::{OptionalExtension, params};

use super::Store;
use crate::error::Result;

/// Metadata key: RFC 3339 timestamp of the last run.
pub const LAST_INDEXED: &str = "last_indexed";
/// Metadata key: files in the store after the last run.
pub const TOTAL_FILES: &str = "total_files";
/// Metadata key: symbols in the store after the last run.
pub const TOTAL_SYMBOLS: &str = "total_symbols";
/// Metadata key: mode of the last run.
pub const LAST_MODE: &str = "last_mode";
/// Metadata key: name of the indexer that produced the last index.
pub const SCIP_TOOL: &str = "scip_tool";
/// Metadata key: version of that indexer.
pub const SCIP_TOOL_VERSION: &str = "scip_tool_version";
/// Metadata key: project root recorded in the last index.
pub const PROJECT_ROOT: &str = "project_root";
/// Metadata key: git `HEAD` of the project root at the last run.
pub const LAST_COMMIT: &str = "last_commit";

impl Store {
    /// Overwrite metadata entries in one transaction.
    pub fn set_metadata(&self, entries: &[(&str, String)]) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        {
            let mut stmt =
                tx.prepare("INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)")?;
            for (key, value) in entries {
                stmt.execute(params![key, value])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Get one metadata value.
    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let conn = self.connection()?;
        conn.query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()
        .map_err(Into::into)
    }

    /// All metadata, ordered by key.
    pub fn all_metadata(&self) -> Result<BTreeMap<String, String>> {
        let conn = self.connection()?;
        read_all(&conn)
    }
}

pub(crate) fn read_all(conn: &rusqlite::Connection) -> Result<BTreeMap<String, String>> {
    let mut stmt = conn.prepare("SELECT key, value FROM metadata")?;
    let entries = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<BTreeMap<_, _>, _>>()?;
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::temp_db;
    use super::*;

    #[test]
    fn set_metadata_overwrites_existing_values() {
        let (_dir, path) = temp_db();
        let store = Store::open(&path).unwrap();

        store
            .set_metadata(&[(TOTAL_FILES, "3".into()), (LAST_MODE, "full".into())])
            .unwrap();
        store.set_metadata(&[(TOTAL_FILES, "5".into())]).unwrap();

        assert_eq!(store.get_metadata(TOTAL_FILES).unwrap().as_deref(), Some("5"));
        let all = store.all_metadata().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[LAST_MODE], "full");
    }

    #[test]
    fn missing_key_is_none() {
        let (_dir, path) = temp_db();
        let store = Store::open(&path).unwrap();
        assert_eq!(store.get_metadata("nope").unwrap(), None);
    }
}
