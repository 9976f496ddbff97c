//! Read-only store handle.
//!
//! The file is opened with `SQLITE_OPEN_READ_ONLY` and `query_only` is set, so
//! any write through this handle fails inside `SQLite` regardless of how the
//! statement is dressed up (comments, CTEs, lowercase keywords). Such
//! failures surface as [`Error::WriteRejected`].

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, ErrorCode, OpenFlags};

use crate::error::{Error, Result};

/// Read-only `SQLite` connection used by the query engine.
pub struct ReadOnlyConnection {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl ReadOnlyConnection {
    /// Open an existing store without write access.
    ///
    /// Fails with [`Error::StoreOpen`] if the file does not exist or is not a
    /// store.
    pub fn open(path: &Path) -> Result<Self> {
        let store_open = |source: rusqlite::Error| Error::StoreOpen {
            path: path.to_path_buf(),
            source,
        };

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(store_open)?;
        conn.pragma_update(None, "query_only", "ON")
            .map_err(store_open)?;
        // Touch the schema so a non-database file fails here, not on first query.
        conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(store_open)?;

        tracing::debug!(path = %path.display(), "Opened store read-only");

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

    /// Acquire the connection lock, converting poison errors to our error type.
    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::Internal(format!("mutex poisoned: {e}")))
    }
}

/// Map a `SQLite` failure on a read-only handle to the crate error type.
///
/// Failures caused by the handle refusing to write become
/// [`Error::WriteRejected`]; everything else stays a database error.
pub(crate) fn map_read_only_error(error: rusqlite::Error, sql: &str) -> Error {
    match &error {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ReadOnly => {
            Error::WriteRejected(sql.trim().to_string())
        }
        _ => Error::Database(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use crate::db::test_support::temp_db;

    #[test]
    fn open_missing_file_is_store_open_error() {
        let (dir, _) = temp_db();
        let err = ReadOnlyConnection::open(&dir.path().join("absent.db"))
            .err()
            .expect("open should fail");
        assert!(matches!(err, Error::StoreOpen { .. }));
    }

    #[test]
    fn sqlite_rejects_writes_on_read_only_handle() {
        let (_dir, path) = temp_db();
        drop(Store::open(&path).unwrap());

        let ro = ReadOnlyConnection::open(&path).unwrap();
        let conn = ro.lock().unwrap();
        let sql = "INSERT INTO metadata (key, value) VALUES ('a', 'b')";
        let err = conn.execute(sql, []).unwrap_err();

        assert!(matches!(
            map_read_only_error(err, sql),
            Error::WriteRejected(_)
        ));
    }

    #[test]
    fn other_failures_stay_database_errors() {
        let (_dir, path) = temp_db();
        drop(Store::open(&path).unwrap());

        let ro = ReadOnlyConnection::open(&path).unwrap();
        let conn = ro.lock().unwrap();
        let sql = "SELECT * FROM no_such_table";
        let err = conn.prepare(sql).map(|_| ()).unwrap_err();

        assert!(matches!(map_read_only_error(err, sql), Error::Database(_)));
    }
}
