//! Database schema definition for the graph store.
//!
//! Table and column names are read by external tooling; treat them as a
//! compatibility surface.

/// Database schema definition.
pub(crate) const SCHEMA: &str = r"
-- Source files named by the index
CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY,
    path TEXT NOT NULL UNIQUE,
    language TEXT NOT NULL,
    mtime INTEGER NOT NULL DEFAULT 0,
    symbol_count INTEGER NOT NULL DEFAULT 0,
    indexed_at INTEGER NOT NULL,
    dependency_count INTEGER NOT NULL DEFAULT 0,
    dependent_count INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_files_path ON files(path);
CREATE INDEX IF NOT EXISTS idx_files_mtime ON files(mtime);

-- Symbol definitions (one row per defining occurrence)
CREATE TABLE IF NOT EXISTS symbols (
    id INTEGER PRIMARY KEY,
    file_id INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    scip_symbol TEXT NOT NULL,
    kind TEXT NOT NULL,
    start_line INTEGER NOT NULL,
    end_line INTEGER NOT NULL,
    start_char INTEGER NOT NULL,
    end_char INTEGER NOT NULL,
    documentation TEXT,
    package TEXT,
    is_local INTEGER NOT NULL DEFAULT 0,
    reference_count INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_symbols_name ON symbols(name);
CREATE INDEX IF NOT EXISTS idx_symbols_file ON symbols(file_id);
CREATE INDEX IF NOT EXISTS idx_symbols_package ON symbols(package);
CREATE INDEX IF NOT EXISTS idx_symbols_kind ON symbols(kind);
CREATE INDEX IF NOT EXISTS idx_symbols_is_local ON symbols(is_local);
CREATE INDEX IF NOT EXISTS idx_symbols_scip ON symbols(scip_symbol);

-- File-level dependency edges; symbols is a sorted JSON array of names
CREATE TABLE IF NOT EXISTS dependencies (
    from_file_id INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    to_file_id INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    symbol_count INTEGER NOT NULL DEFAULT 0,
    symbols TEXT NOT NULL DEFAULT '[]',
    PRIMARY KEY (from_file_id, to_file_id),
    CHECK (from_file_id <> to_file_id)
);

CREATE INDEX IF NOT EXISTS idx_dependencies_from ON dependencies(from_file_id);
CREATE INDEX IF NOT EXISTS idx_dependencies_to ON dependencies(to_file_id);

-- Usages of symbols outside their definition
CREATE TABLE IF NOT EXISTS symbol_references (
    id INTEGER PRIMARY KEY,
    symbol_id INTEGER NOT NULL REFERENCES symbols(id) ON DELETE CASCADE,
    file_id INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    line INTEGER NOT NULL,
    UNIQUE (symbol_id, file_id, line)
);

CREATE INDEX IF NOT EXISTS idx_symbol_references_symbol ON symbol_references(symbol_id);
CREATE INDEX IF NOT EXISTS idx_symbol_references_file ON symbol_references(file_id);

-- Symbols aggregated by owning package
CREATE TABLE IF NOT EXISTS packages (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    manager TEXT NOT NULL,
    version TEXT,
    symbol_count INTEGER NOT NULL DEFAULT 0
);

-- Run metadata
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";
