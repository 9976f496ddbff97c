//! Cross-document symbol resolution.
//!
//! A [`SymbolTable`] is built once per conversion run over the whole decoded
//! index and never mutated afterwards. It answers three lookups:
//!
//! - symbol → metadata (external symbols first, then document symbols; the
//!   first record for a symbol wins)
//! - symbol → defining document and definition occurrence (first definition
//!   wins; local symbols are never entered)
//! - path → document
//!
//! From those, [`SymbolTable::file_dependencies`] computes the files a
//! document depends on together with the symbol names justifying each edge.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::trace;

use crate::scip::{Document, Occurrence, ScipIndex, SymbolInformation};
use crate::symbol;

/// Where a non-local symbol is defined.
#[derive(Debug, Clone, Copy)]
pub struct Definition<'a> {
    /// Path of the defining document
    pub path: &'a str,
    /// The defining occurrence
    pub occurrence: &'a Occurrence,
}

/// Immutable lookup maps over a decoded index.
#[derive(Debug, Default)]
pub struct SymbolTable<'a> {
    metadata: HashMap<&'a str, &'a SymbolInformation>,
    definitions: HashMap<&'a str, Definition<'a>>,
    documents: HashMap<&'a str, &'a Document>,
}

impl<'a> SymbolTable<'a> {
    /// Build the lookup maps for an index.
    #[must_use]
    pub fn build(index: &'a ScipIndex) -> Self {
        let mut table = Self::default();

        for info in &index.external_symbols {
            table.metadata.entry(info.symbol.as_str()).or_insert(info);
        }

        for doc in &index.documents {
            table
                .documents
                .entry(doc.relative_path.as_str())
                .or_insert(doc);

            for info in &doc.symbols {
                table.metadata.entry(info.symbol.as_str()).or_insert(info);
            }

            for occurrence in doc.occurrences.iter().filter(|occ| occ.is_definition()) {
                if occurrence.symbol.is_empty() || symbol::is_local(&occurrence.symbol) {
                    continue;
                }
                table
                    .definitions
                    .entry(occurrence.symbol.as_str())
                    .or_insert(Definition {
                        path: doc.relative_path.as_str(),
                        occurrence,
                    });
            }
        }

        tracing::debug!(
            metadata = table.metadata.len(),
            definitions = table.definitions.len(),
            documents = table.documents.len(),
            "Built symbol table"
        );

        table
    }

    /// Metadata recorded for a symbol.
    #[must_use]
    pub fn metadata(&self, symbol: &str) -> Option<&'a SymbolInformation> {
        self.metadata.get(symbol).copied()
    }

    /// Where a non-local symbol is defined.
    #[must_use]
    pub fn definition(&self, symbol: &str) -> Option<Definition<'a>> {
        self.definitions.get(symbol).copied()
    }

    /// The document at a path.
    #[must_use]
    pub fn document(&self, path: &str) -> Option<&'a Document> {
        self.documents.get(path).copied()
    }

    /// Display name for a symbol: the metadata display name when present,
    /// otherwise derived from the identifier.
    #[must_use]
    pub fn display_name(&self, symbol: &str) -> String {
        self.metadata(symbol)
            .map(|info| info.display_name.trim())
            .filter(|name| !name.is_empty())
            .map_or_else(|| symbol::display_name(symbol), str::to_string)
    }

    /// Files this document depends on, with the sorted names justifying each
    /// edge.
    ///
    /// Local symbols, self-references and symbols without a known definition
    /// are skipped. Names that are empty or literally `unknown` do not count;
    /// an edge left with no usable names is dropped.
    #[must_use]
    pub fn file_dependencies(&self, doc: &Document) -> BTreeMap<&'a str, BTreeSet<String>> {
        let mut deps: BTreeMap<&'a str, BTreeSet<String>> = BTreeMap::new();

        for occurrence in doc.occurrences.iter().filter(|occ| !occ.is_definition()) {
            if occurrence.symbol.is_empty() || symbol::is_local(&occurrence.symbol) {
                continue;
            }
            let Some(definition) = self.definition(&occurrence.symbol) else {
                continue;
            };
            if definition.path == doc.relative_path {
                continue;
            }

            let name = self.display_name(&occurrence.symbol);
            if name.is_empty() || name == "unknown" {
                trace!(
                    from = %doc.relative_path,
                    to = %definition.path,
                    symbol = %occurrence.symbol,
                    "Dropping unusable symbol name"
                );
                continue;
            }

            deps.entry(definition.path).or_default().insert(name);
        }

        deps
    }
}
