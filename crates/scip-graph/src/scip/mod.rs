//! SCIP protocol decoder.
//!
//! Turns a serialized SCIP index into plain Rust structures: documents with
//! their occurrences and symbol metadata, the external symbol list, and the
//! optional tool metadata. Occurrence ranges are normalized to four elements
//! on the way in so nothing downstream deals with the three-element form.
//!
//! Decoding is all-or-nothing: a malformed payload or a single bad range fails
//! the whole index.

pub mod proto;

use std::path::Path;

use prost::Message;
use tracing::debug;

use crate::error::{DecodeError, Result};
use crate::types::Span;

/// `SymbolRole` bit marking the defining occurrence of a symbol.
pub const ROLE_DEFINITION: i32 = 0x1;

/// A decoded SCIP index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScipIndex {
    /// Documents in index order
    pub documents: Vec<Document>,
    /// Symbols defined outside the indexed documents
    pub external_symbols: Vec<SymbolInformation>,
    /// The indexer that produced this index, if recorded
    pub tool: Option<ToolInfo>,
    /// Project root URI, if recorded
    pub project_root: Option<String>,
}

/// The indexer that produced an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInfo {
    /// Tool name
    pub name: String,
    /// Tool version
    pub version: String,
    /// Arguments the tool was invoked with
    pub arguments: Vec<String>,
}

/// A decoded source document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Path relative to the project root
    pub relative_path: String,
    /// Declared language (may be empty)
    pub language: String,
    /// Occurrences in source order
    pub occurrences: Vec<Occurrence>,
    /// Metadata for symbols defined here
    pub symbols: Vec<SymbolInformation>,
}

/// A symbol occurrence with a normalized range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// Normalized range
    pub range: Span,
    /// Raw symbol identifier
    pub symbol: String,
    /// Role bitmask
    pub roles: i32,
}

impl Occurrence {
    /// Whether this occurrence defines its symbol.
    #[must_use]
    pub fn is_definition(&self) -> bool {
        self.roles & ROLE_DEFINITION != 0
    }
}

/// Metadata about a symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInformation {
    /// Raw symbol identifier
    pub symbol: String,
    /// Display name (may be empty)
    pub display_name: String,
    /// Raw `SymbolInformation.Kind` value
    pub kind: i32,
    /// Documentation lines
    pub documentation: Vec<String>,
    /// Relationships to other symbols
    pub relationships: Vec<Relationship>,
}

/// A relationship between two symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// The related symbol
    pub symbol: String,
    /// References to the related symbol count as references to this one
    pub is_reference: bool,
    /// This symbol implements the related symbol
    pub is_implementation: bool,
    /// The related symbol is this symbol's type definition
    pub is_type_definition: bool,
    /// This symbol defines the related symbol
    pub is_definition: bool,
}

/// Read and decode a SCIP index file.
pub fn decode_file(path: &Path) -> Result<ScipIndex> {
    let bytes = std::fs::read(path)?;
    debug!(path = %path.display(), bytes = bytes.len(), "Read SCIP index");
    Ok(decode(&bytes)?)
}

/// Decode a serialized SCIP index.
pub fn decode(bytes: &[u8]) -> std::result::Result<ScipIndex, DecodeError> {
    let raw = proto::Index::decode(bytes)?;

    let documents = raw
        .documents
        .into_iter()
        .map(convert_document)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let (tool, project_root) = match raw.metadata {
        Some(metadata) => (
            metadata.tool_info.map(|tool| ToolInfo {
                name: tool.name,
                version: tool.version,
                arguments: tool.arguments,
            }),
            Some(metadata.project_root).filter(|root| !root.is_empty()),
        ),
        None => (None, None),
    };

    Ok(ScipIndex {
        documents,
        external_symbols: raw
            .external_symbols
            .into_iter()
            .map(convert_symbol)
            .collect(),
        tool,
        project_root,
    })
}

fn convert_document(doc: proto::Document) -> std::result::Result<Document, DecodeError> {
    let occurrences = doc
        .occurrences
        .into_iter()
        .map(|occ| {
            Ok(Occurrence {
                range: normalize_range(&occ.range, &doc.relative_path)?,
                symbol: occ.symbol,
                roles: occ.symbol_roles,
            })
        })
        .collect::<std::result::Result<Vec<_>, DecodeError>>()?;

    Ok(Document {
        occurrences,
        symbols: doc.symbols.into_iter().map(convert_symbol).collect(),
        relative_path: doc.relative_path,
        language: doc.language,
    })
}

fn convert_symbol(info: proto::SymbolInformation) -> SymbolInformation {
    SymbolInformation {
        symbol: info.symbol,
        display_name: info.display_name,
        kind: info.kind,
        documentation: info.documentation,
        relationships: info
            .relationships
            .into_iter()
            .map(|rel| Relationship {
                symbol: rel.symbol,
                is_reference: rel.is_reference,
                is_implementation: rel.is_implementation,
                is_type_definition: rel.is_type_definition,
                is_definition: rel.is_definition,
            })
            .collect(),
    }
}

/// Normalize a SCIP range to four elements.
///
/// A three-element range `[line, start_char, end_char]` lies on a single line,
/// so the line is duplicated as the end line.
fn normalize_range(range: &[i32], path: &str) -> std::result::Result<Span, DecodeError> {
    let [start_line, start_char, end_line, end_char] = match *range {
        [line, start, end] => [line, start, line, end],
        [start_line, start_char, end_line, end_char] => {
            [start_line, start_char, end_line, end_char]
        }
        _ => {
            return Err(DecodeError::InvalidRange {
                path: path.to_string(),
                len: range.len(),
            });
        }
    };

    let position = |value: i32| {
        u32::try_from(value).map_err(|_| DecodeError::NegativePosition {
            path: path.to_string(),
        })
    };

    Ok(Span {
        start_line: position(start_line)?,
        start_char: position(start_char)?,
        end_line: position(end_line)?,
        end_char: position(end_char)?,
    })
}
