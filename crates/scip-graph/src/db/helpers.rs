//! Helper functions for database row conversion and parsing.
//!
//! Also provides SQL column list constants so every query selects columns in
//! the order the row converters expect.

// SQLite stores every integer as i64. Counters and positions written by this
// crate are never negative.
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]

use crate::types::{
    Dependency, FileId, IndexedFile, Package, Span, Symbol, SymbolId, SymbolKind, SymbolReference,
};

/// SQL column list for the files table.
///
/// Use with `row_to_indexed_file` for consistent column ordering.
pub(crate) const FILES_COLUMNS: &str = "id, path, language, mtime, indexed_at, symbol_count, \
     dependency_count, dependent_count";

/// SQL column list for the symbols table.
///
/// Use with `row_to_symbol` for consistent column ordering.
pub(crate) const SYMBOLS_COLUMNS: &str = "id, file_id, name, scip_symbol, kind, start_line, \
     start_char, end_line, end_char, documentation, package, is_local, reference_count";

/// SQL column list for the dependencies table.
pub(crate) const DEPENDENCIES_COLUMNS: &str = "from_file_id, to_file_id, symbol_count, symbols";

/// SQL column list for the `symbol_references` table.
pub(crate) const REFERENCES_COLUMNS: &str = "id, symbol_id, file_id, line";

/// SQL column list for the packages table.
pub(crate) const PACKAGES_COLUMNS: &str = "id, name, manager, version, symbol_count";

/// Parse a symbol kind string from the database.
///
/// Returns an error for unrecognized values, indicating possible database corruption.
pub(crate) fn parse_symbol_kind(s: &str) -> rusqlite::Result<SymbolKind> {
    SymbolKind::parse(s).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!(
                "Unknown symbol kind '{s}' in database. Database may be corrupted or from a newer version."
            )
            .into(),
        )
    })
}

/// Parse the JSON symbol-name array stored on a dependency edge.
pub(crate) fn parse_symbol_names(s: &str) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Convert a database row to an [`IndexedFile`].
pub(crate) fn row_to_indexed_file(row: &rusqlite::Row) -> rusqlite::Result<IndexedFile> {
    Ok(IndexedFile {
        id: FileId::from(row.get::<_, i64>(0)?),
        path: row.get(1)?,
        language: row.get(2)?,
        mtime: row.get(3)?,
        indexed_at: row.get(4)?,
        symbol_count: row.get::<_, i64>(5)? as u64,
        dependency_count: row.get::<_, i64>(6)? as u64,
        dependent_count: row.get::<_, i64>(7)? as u64,
    })
}

/// Convert a database row to a [`Symbol`].
pub(crate) fn row_to_symbol(row: &rusqlite::Row) -> rusqlite::Result<Symbol> {
    Ok(Symbol {
        id: SymbolId::from(row.get::<_, i64>(0)?),
        file_id: FileId::from(row.get::<_, i64>(1)?),
        name: row.get(2)?,
        scip_symbol: row.get(3)?,
        kind: parse_symbol_kind(&row.get::<_, String>(4)?)?,
        span: Span {
            start_line: row.get(5)?,
            start_char: row.get(6)?,
            end_line: row.get(7)?,
            end_char: row.get(8)?,
        },
        documentation: row.get(9)?,
        package: row.get(10)?,
        is_local: row.get(11)?,
        reference_count: row.get::<_, i64>(12)? as u64,
    })
}

/// Convert a database row to a [`Dependency`].
pub(crate) fn row_to_dependency(row: &rusqlite::Row) -> rusqlite::Result<Dependency> {
    Ok(Dependency {
        from_file_id: FileId::from(row.get::<_, i64>(0)?),
        to_file_id: FileId::from(row.get::<_, i64>(1)?),
        symbol_count: row.get::<_, i64>(2)? as u64,
        symbols: parse_symbol_names(&row.get::<_, String>(3)?)?,
    })
}

/// Convert a database row to a [`SymbolReference`].
pub(crate) fn row_to_reference(row: &rusqlite::Row) -> rusqlite::Result<SymbolReference> {
    Ok(SymbolReference {
        id: row.get(0)?,
        symbol_id: SymbolId::from(row.get::<_, i64>(1)?),
        file_id: FileId::from(row.get::<_, i64>(2)?),
        line: row.get(3)?,
    })
}

/// Convert a database row to a [`Package`].
pub(crate) fn row_to_package(row: &rusqlite::Row) -> rusqlite::Result<Package> {
    Ok(Package {
        id: row.get(0)?,
        name: row.get(1)?,
        manager: row.get(2)?,
        version: row.get(3)?,
        symbol_count: row.get::<_, i64>(4)? as u64,
    })
}
