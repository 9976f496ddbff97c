//! Wire-level SCIP messages.
//!
//! A hand-maintained subset of the public `scip.proto` schema, covering the
//! fields this crate reads. Field numbers must match the schema exactly;
//! fields not listed here are skipped by the decoder. Enum-typed fields are
//! carried as `int32`, which has the same varint wire encoding.

/// Root message of a SCIP index.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Index {
    /// Tool and project information
    #[prost(message, optional, tag = "1")]
    pub metadata: Option<Metadata>,
    /// Documents defined by the index
    #[prost(message, repeated, tag = "2")]
    pub documents: Vec<Document>,
    /// Symbols referenced from, but not defined in, the indexed documents
    #[prost(message, repeated, tag = "3")]
    pub external_symbols: Vec<SymbolInformation>,
}

/// Index-wide metadata.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Metadata {
    /// `ProtocolVersion` enum
    #[prost(int32, tag = "1")]
    pub version: i32,
    /// Tool that produced the index
    #[prost(message, optional, tag = "2")]
    pub tool_info: Option<ToolInfo>,
    /// URI of the project root
    #[prost(string, tag = "3")]
    pub project_root: String,
    /// `TextEncoding` enum
    #[prost(int32, tag = "4")]
    pub text_document_encoding: i32,
}

/// The indexer that produced an index.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ToolInfo {
    /// Tool name, e.g. `scip-typescript`
    #[prost(string, tag = "1")]
    pub name: String,
    /// Tool version
    #[prost(string, tag = "2")]
    pub version: String,
    /// Command-line arguments the tool was invoked with
    #[prost(string, repeated, tag = "3")]
    pub arguments: Vec<String>,
}

/// A single source file.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Document {
    /// Path relative to the project root
    #[prost(string, tag = "1")]
    pub relative_path: String,
    /// Occurrences in source order
    #[prost(message, repeated, tag = "2")]
    pub occurrences: Vec<Occurrence>,
    /// Metadata for symbols defined in this document
    #[prost(message, repeated, tag = "3")]
    pub symbols: Vec<SymbolInformation>,
    /// Language name
    #[prost(string, tag = "4")]
    pub language: String,
}

/// Metadata about a symbol.
#[derive(Clone, PartialEq, prost::Message)]
pub struct SymbolInformation {
    /// Raw symbol identifier
    #[prost(string, tag = "1")]
    pub symbol: String,
    /// Markdown documentation lines
    #[prost(string, repeated, tag = "3")]
    pub documentation: Vec<String>,
    /// Relationships to other symbols
    #[prost(message, repeated, tag = "4")]
    pub relationships: Vec<Relationship>,
    /// `SymbolInformation.Kind` enum
    #[prost(int32, tag = "5")]
    pub kind: i32,
    /// Name to show to users
    #[prost(string, tag = "6")]
    pub display_name: String,
    /// Enclosing symbol for local definitions
    #[prost(string, tag = "8")]
    pub enclosing_symbol: String,
}

/// A relationship between two symbols.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Relationship {
    /// The related symbol
    #[prost(string, tag = "1")]
    pub symbol: String,
    /// References to the related symbol count as references to this one
    #[prost(bool, tag = "2")]
    pub is_reference: bool,
    /// This symbol implements the related symbol
    #[prost(bool, tag = "3")]
    pub is_implementation: bool,
    /// The related symbol is this symbol's type definition
    #[prost(bool, tag = "4")]
    pub is_type_definition: bool,
    /// This symbol defines the related symbol
    #[prost(bool, tag = "5")]
    pub is_definition: bool,
}

/// A symbol occurrence at a source range.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Occurrence {
    /// `[start_line, start_char, end_char]` or
    /// `[start_line, start_char, end_line, end_char]`
    #[prost(int32, repeated, tag = "1")]
    pub range: Vec<i32>,
    /// Raw symbol identifier
    #[prost(string, tag = "2")]
    pub symbol: String,
    /// `SymbolRole` bitmask
    #[prost(int32, tag = "3")]
    pub symbol_roles: i32,
}
