//! Error types for scip-graph operations.
//!
//! Errors fall into three groups:
//!
//! - **`Error`**: top-level failures that halt an operation (malformed index,
//!   store cannot be opened, database failures, rejected writes)
//! - **`QueryError`**: typed query failures returned to the caller, who decides
//!   how to present them (unknown path, no path found, invalid argument)
//! - **`DocumentError`**: per-document failures collected during conversion;
//!   the document is skipped and the run continues
//!
//! ## Error Philosophy
//!
//! Conversion is "best effort" at document granularity: a single document that
//! cannot be written shouldn't prevent converting the rest. Only infrastructure
//! failures (decode, store, I/O) abort a run.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for scip-graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for scip-graph operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The SCIP payload could not be decoded. Nothing was written.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The store could not be opened or created.
    #[error("cannot open store at {}: {source}", .path.display())]
    StoreOpen {
        /// Location of the store
        path: PathBuf,
        /// Underlying `SQLite` failure
        #[source]
        source: rusqlite::Error,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A write statement was issued through a read-only handle.
    #[error("write rejected on read-only store: {0}")]
    WriteRejected(String),

    /// A query could not be answered.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Invalid configuration or arguments
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal invariant violated
    #[error("internal error: {0}")]
    Internal(String),
}

/// Failure to decode a SCIP index.
///
/// Decoding is all-or-nothing: any of these aborts the whole payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The buffer is not a valid serialized SCIP index.
    #[error("malformed SCIP payload: {0}")]
    Protobuf(#[from] prost::DecodeError),

    /// An occurrence range did not have 3 or 4 elements.
    #[error("{path}: occurrence range has {len} elements (expected 3 or 4)")]
    InvalidRange {
        /// Document containing the occurrence
        path: String,
        /// Number of elements found
        len: usize,
    },

    /// An occurrence range contained a negative position.
    #[error("{path}: occurrence range contains a negative position")]
    NegativePosition {
        /// Document containing the occurrence
        path: String,
    },
}

/// Typed failure of a graph query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The path is not an indexed file.
    #[error("file not indexed: {path}{}", format_suggestions(.suggestions))]
    FileNotFound {
        /// Normalized path that was looked up
        path: String,
        /// Indexed paths that look similar
        suggestions: Vec<String>,
    },

    /// The path names a directory of indexed files, not a file.
    #[error("{path} is a directory ({} indexed files below it)", .candidates.len())]
    IsDirectory {
        /// Normalized path that was looked up
        path: String,
        /// Indexed files below the directory
        candidates: Vec<String>,
    },

    /// No dependency path exists within the search bound.
    #[error("no path found from {from} to {to} within {max_depth} hops")]
    NoPath {
        /// Source file
        from: String,
        /// Target file
        to: String,
        /// Search bound that was exhausted
        max_depth: u32,
    },

    /// A caller-supplied argument is out of range or unknown.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}

/// Error encountered while converting a specific document.
///
/// These errors are collected during conversion but don't halt the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentError {
    /// Relative path of the document that failed
    pub path: String,
    /// Category of the error
    pub kind: DocumentErrorKind,
    /// Human-readable error message
    pub message: String,
}

impl std::fmt::Display for DocumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.path, self.message, self.kind)
    }
}

impl std::error::Error for DocumentError {}

/// Categorization of per-document conversion errors.
///
/// Uses a 4xx/5xx style pattern:
/// - Input problems are issues with the index contents (the indexer can fix)
/// - Internal problems are issues with the store (we need to fix)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentErrorKind {
    // === Input Problems (analogous to HTTP 4xx) ===
    /// Document has an empty relative path
    EmptyPath,

    /// Another document with the same path was already converted in this run
    DuplicatePath,

    // === Internal Problems (analogous to HTTP 5xx) ===
    /// Database operation failed for this document
    DatabaseError,
}

impl std::fmt::Display for DocumentErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPath => write!(f, "empty path"),
            Self::DuplicatePath => write!(f, "duplicate path"),
            Self::DatabaseError => write!(f, "database error"),
        }
    }
}

impl DocumentErrorKind {
    /// Returns `true` if this is an input problem (4xx-style).
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::EmptyPath | Self::DuplicatePath)
    }

    /// Returns `true` if this is an internal problem (5xx-style).
    #[must_use]
    pub fn is_internal_error(&self) -> bool {
        matches!(self, Self::DatabaseError)
    }
}

impl DocumentError {
    /// Create a new document error.
    #[must_use]
    pub fn new(path: impl Into<String>, kind: DocumentErrorKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }

    /// Create an error for a document with no path.
    #[must_use]
    pub fn empty_path() -> Self {
        Self::new("", DocumentErrorKind::EmptyPath, "document has no relative path")
    }

    /// Create an error for a path seen twice in one index.
    #[must_use]
    pub fn duplicate_path(path: impl Into<String>) -> Self {
        Self::new(
            path,
            DocumentErrorKind::DuplicatePath,
            "path appears more than once in the index",
        )
    }

    /// Create a database error for a document.
    #[must_use]
    pub fn database(path: impl Into<String>, error: &rusqlite::Error) -> Self {
        Self::new(path, DocumentErrorKind::DatabaseError, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_error_kind_categorization() {
        assert!(DocumentErrorKind::EmptyPath.is_input_error());
        assert!(DocumentErrorKind::DuplicatePath.is_input_error());
        assert!(!DocumentErrorKind::EmptyPath.is_internal_error());

        assert!(DocumentErrorKind::DatabaseError.is_internal_error());
        assert!(!DocumentErrorKind::DatabaseError.is_input_error());
    }

    #[test]
    fn document_error_display_includes_path_and_kind() {
        let error = DocumentError::duplicate_path("src/app.ts");

        let display = error.to_string();
        assert!(display.contains("src/app.ts"));
        assert!(display.contains("more than once"));
        assert!(display.contains("duplicate path"));
    }

    #[test]
    fn file_not_found_lists_suggestions() {
        let error = QueryError::FileNotFound {
            path: "app.ts".to_string(),
            suggestions: vec!["src/app.ts".to_string(), "lib/app.ts".to_string()],
        };

        let display = error.to_string();
        assert!(display.contains("file not indexed: app.ts"));
        assert!(display.contains("did you mean: src/app.ts, lib/app.ts?"));
    }

    #[test]
    fn file_not_found_without_suggestions_is_terse() {
        let error = QueryError::FileNotFound {
            path: "nope.ts".to_string(),
            suggestions: vec![],
        };

        assert_eq!(error.to_string(), "file not indexed: nope.ts");
    }

    #[test]
    fn query_error_converts_into_top_level_error() {
        let error: Error = QueryError::InvalidArgument("limit must be at least 1".into()).into();

        assert!(matches!(error, Error::Query(QueryError::InvalidArgument(_))));
        assert_eq!(error.to_string(), "invalid argument: limit must be at least 1");
    }
}
