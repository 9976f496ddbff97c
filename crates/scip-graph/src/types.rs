//! Domain types for scip-graph.
//!
//! These types represent the core domain model:
//! - **Entities**: `IndexedFile`, `Symbol`, `Dependency`, `SymbolReference`,
//!   `Package` (stored in the database)
//! - **Results**: `RunStats` (conversion result)
//!
//! ## Design Decisions
//!
//! | Decision | Choice | Rationale |
//! |----------|--------|-----------|
//! | Paths | `String`, forward slashes | SCIP documents carry relative paths as strings |
//! | Kind | Closed enum | Raw SCIP kinds are collapsed onto a small vocabulary |
//! | Counters | Stored, recomputed | Cheap reads, no drift |
//! | Span | 0-indexed | Matches SCIP occurrence ranges |

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

// ============================================================================
// Strongly-typed ID wrappers
// ============================================================================

/// A strongly-typed symbol ID to prevent mixing with file IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub i64);

impl SymbolId {
    /// Extract the raw i64 value.
    #[must_use]
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl From<i64> for SymbolId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A strongly-typed file ID to prevent mixing with symbol IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub i64);

impl FileId {
    /// Extract the raw i64 value.
    #[must_use]
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl From<i64> for FileId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Coarse symbol kinds.
///
/// The SCIP protocol defines close to ninety kinds; they are collapsed onto
/// this vocabulary by [`crate::kind::from_scip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    /// Class (including singleton classes)
    Class,
    /// Free function
    Function,
    /// Method (including abstract, static and trait methods)
    Method,
    /// Interface or protocol
    Interface,
    /// Named type
    Type,
    /// Type alias (`type X = ...`)
    TypeAlias,
    /// Enum type
    Enum,
    /// Enum member
    EnumMember,
    /// Field (including static fields)
    Field,
    /// Property (including static properties)
    Property,
    /// Variable
    Variable,
    /// Constant
    Constant,
    /// Parameter (including `self`/`this`)
    Parameter,
    /// Generic type parameter
    TypeParameter,
    /// Module
    Module,
    /// Namespace
    Namespace,
    /// Package or library
    Package,
    /// Constructor
    Constructor,
    /// Property getter
    Getter,
    /// Property setter
    Setter,
    /// Struct
    Struct,
    /// Trait, mixin or concept
    Trait,
    /// Macro
    Macro,
    /// Union type
    Union,
    /// Object literal or singleton object
    Object,
    /// Event
    Event,
    /// Operator
    Operator,
    /// Anything the mapping and heuristics could not place
    Unknown,
}

impl SymbolKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 28] = [
        Self::Class,
        Self::Function,
        Self::Method,
        Self::Interface,
        Self::Type,
        Self::TypeAlias,
        Self::Enum,
        Self::EnumMember,
        Self::Field,
        Self::Property,
        Self::Variable,
        Self::Constant,
        Self::Parameter,
        Self::TypeParameter,
        Self::Module,
        Self::Namespace,
        Self::Package,
        Self::Constructor,
        Self::Getter,
        Self::Setter,
        Self::Struct,
        Self::Trait,
        Self::Macro,
        Self::Union,
        Self::Object,
        Self::Event,
        Self::Operator,
        Self::Unknown,
    ];

    /// Convert to database string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Function => "function",
            Self::Method => "method",
            Self::Interface => "interface",
            Self::Type => "type",
            Self::TypeAlias => "type_alias",
            Self::Enum => "enum",
            Self::EnumMember => "enum_member",
            Self::Field => "field",
            Self::Property => "property",
            Self::Variable => "variable",
            Self::Constant => "constant",
            Self::Parameter => "parameter",
            Self::TypeParameter => "type_parameter",
            Self::Module => "module",
            Self::Namespace => "namespace",
            Self::Package => "package",
            Self::Constructor => "constructor",
            Self::Getter => "getter",
            Self::Setter => "setter",
            Self::Struct => "struct",
            Self::Trait => "trait",
            Self::Macro => "macro",
            Self::Union => "union",
            Self::Object => "object",
            Self::Event => "event",
            Self::Operator => "operator",
            Self::Unknown => "unknown",
        }
    }

    /// Parse the database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a conversion run rebuilt everything or only what changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// All tables cleared and rebuilt
    Full,
    /// Only changed and deleted files touched
    Incremental,
}

impl RunMode {
    /// Convert to database string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Incremental => "incremental",
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a document's declared language (or, failing that, its extension) to a
/// lowercase language tag.
#[must_use]
pub fn language_tag(declared: &str, path: &str) -> String {
    let declared = declared.trim();
    if !declared.is_empty() {
        return declared.to_lowercase();
    }

    let ext = path.rsplit_once('.').map_or("", |(_, ext)| ext);
    let tag = match ext.to_lowercase().as_str() {
        "ts" | "mts" | "cts" => "typescript",
        "tsx" => "typescriptreact",
        "js" | "mjs" | "cjs" => "javascript",
        "jsx" => "javascriptreact",
        "py" | "pyi" => "python",
        "rs" => "rust",
        "go" => "go",
        "java" => "java",
        "kt" | "kts" => "kotlin",
        "scala" | "sc" => "scala",
        "cs" => "csharp",
        "rb" => "ruby",
        "php" => "php",
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hpp" | "hh" => "cpp",
        "swift" => "swift",
        "dart" => "dart",
        _ => "unknown",
    };
    tag.to_string()
}

// ============================================================================
// Core Entities (stored in database)
// ============================================================================

/// A source range in a document.
///
/// Positions are 0-indexed, as SCIP ranges are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Starting line
    pub start_line: u32,
    /// Starting column
    pub start_char: u32,
    /// Ending line (inclusive)
    pub end_line: u32,
    /// Ending column (exclusive)
    pub end_char: u32,
}

impl Span {
    /// Create a new span with validation.
    ///
    /// Returns `None` if the end position is before the start position.
    #[must_use]
    pub fn new(start_line: u32, start_char: u32, end_line: u32, end_char: u32) -> Option<Self> {
        if end_line < start_line || (end_line == start_line && end_char < start_char) {
            return None;
        }
        Some(Self {
            start_line,
            start_char,
            end_line,
            end_char,
        })
    }
}

/// A source file in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedFile {
    /// Database primary key
    pub id: FileId,
    /// Path relative to the project root
    pub path: String,
    /// Lowercase language tag
    pub language: String,
    /// On-disk modification time in nanoseconds since epoch (0 if absent)
    pub mtime: i64,
    /// When this file was last converted (nanoseconds since epoch)
    pub indexed_at: i64,
    /// Number of symbols defined in this file
    pub symbol_count: u64,
    /// Number of distinct files this file depends on
    pub dependency_count: u64,
    /// Number of distinct files depending on this file
    pub dependent_count: u64,
}

/// A symbol definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// Database primary key
    pub id: SymbolId,
    /// Defining file
    pub file_id: FileId,
    /// Display name
    pub name: String,
    /// Raw SCIP symbol identifier
    pub scip_symbol: String,
    /// Coarse kind
    pub kind: SymbolKind,
    /// Definition range
    pub span: Span,
    /// Documentation lines joined with newlines
    pub documentation: Option<String>,
    /// Owning package name, when the identifier names one
    pub package: Option<String>,
    /// Parameters and closure locals; excluded from cross-file analysis
    pub is_local: bool,
    /// Number of recorded usages
    pub reference_count: u64,
}

/// A directed file-to-file edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// The file doing the referencing
    pub from_file_id: FileId,
    /// The file defining the referenced symbols
    pub to_file_id: FileId,
    /// Number of distinct symbol names justifying the edge
    pub symbol_count: u64,
    /// Sorted symbol names justifying the edge
    pub symbols: Vec<String>,
}

/// A usage of a symbol outside its definition site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolReference {
    /// Database primary key
    pub id: i64,
    /// The referenced symbol
    pub symbol_id: SymbolId,
    /// The file containing the usage
    pub file_id: FileId,
    /// 0-indexed line of the usage
    pub line: u32,
}

/// Symbols aggregated by owning package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Database primary key
    pub id: i64,
    /// Normalized package name
    pub name: String,
    /// Package manager (`npm`, `maven`, `gomod`, ...)
    pub manager: String,
    /// First version seen for the package
    pub version: Option<String>,
    /// Number of symbols owned by the package
    pub symbol_count: u64,
}

// ============================================================================
// Operation Results
// ============================================================================

/// Statistics from a conversion run.
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    /// Full rebuild or incremental update
    pub mode: RunMode,
    /// Files in the store after the run
    pub total_files: u64,
    /// Symbols in the store after the run
    pub total_symbols: u64,
    /// Files (re)converted by this run
    pub changed_files: usize,
    /// Files removed by this run
    pub deleted_files: usize,
    /// Wall-clock duration in milliseconds
    pub time_ms: u64,
    /// Documents skipped because they could not be converted
    #[serde(skip)]
    pub errors: Vec<DocumentError>,
}
