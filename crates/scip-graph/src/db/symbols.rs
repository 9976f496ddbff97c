//! Symbol queries.

use std::collections::HashMap;

use rusqlite::params;

use super::Store;
use super::helpers::{SYMBOLS_COLUMNS, row_to_symbol};
use crate::error::Result;
use crate::types::{FileId, Symbol, SymbolId};

impl Store {
    /// List symbols defined in a file, in source order.
    pub fn symbols_in_file(&self, file_id: FileId) -> Result<Vec<Symbol>> {
        let conn = self.connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {SYMBOLS_COLUMNS} FROM symbols WHERE file_id = ?1
             ORDER BY start_line, start_char, id"
        ))?;

        let symbols = stmt
            .query_map([file_id.as_i64()], row_to_symbol)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(symbols)
    }

    /// Find symbols by exact display name.
    pub fn find_symbols(&self, name: &str, limit: usize) -> Result<Vec<Symbol>> {
        // usize limit fits in i64 on all supported platforms
        #[allow(clippy::cast_possible_wrap)]
        let limit_i64 = limit as i64;
        let conn = self.connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {SYMBOLS_COLUMNS} FROM symbols WHERE name = ?1
             ORDER BY is_local, id LIMIT ?2"
        ))?;

        let symbols = stmt
            .query_map(params![name, limit_i64], row_to_symbol)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(symbols)
    }

    /// Map every non-local SCIP identifier to the lowest symbol ID defining it.
    ///
    /// Built once per conversion run to resolve usages to symbol rows.
    pub fn symbol_index(&self) -> Result<HashMap<String, SymbolId>> {
        let conn = self.connection()?;

        let mut stmt = conn.prepare(
            "SELECT scip_symbol, MIN(id) FROM symbols WHERE is_local = 0 GROUP BY scip_symbol",
        )?;
        let index = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, SymbolId::from(row.get::<_, i64>(1)?)))
            })?
            .collect::<std::result::Result<HashMap<_, _>, _>>()?;

        tracing::debug!(symbols = index.len(), "Built symbol identifier index");
        Ok(index)
    }
}
