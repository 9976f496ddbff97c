//! Batched document conversion.
//!
//! Changed documents are turned into [`FileRecord`]s and written
//! `batch_size` at a time, one transaction per batch. Only one batch of
//! records is held in memory at once.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use tracing::{debug, trace};

use super::changes::file_mtime;
use crate::db::{DependencyRecord, FileRecord, ReferenceRecord, Store, SymbolRecord};
use crate::error::{DocumentError, Result};
use crate::kind;
use crate::resolver::SymbolTable;
use crate::scip::Document;
use crate::symbol::{self, PackageRef};
use crate::types::{FileId, SymbolId, SymbolKind, language_tag};

/// Outcome of writing all batches.
#[derive(Debug, Default)]
pub(crate) struct BatchOutcome {
    /// Documents written successfully
    pub written: usize,
    /// Transactions committed
    pub batches: usize,
    /// Documents that failed and were rolled back
    pub errors: Vec<DocumentError>,
}

/// Build the record for one document.
pub(crate) fn document_record(
    doc: &Document,
    table: &SymbolTable<'_>,
    project_root: &Path,
) -> FileRecord {
    let symbols = doc
        .occurrences
        .iter()
        .filter(|occ| occ.is_definition() && !occ.symbol.is_empty())
        .map(|occ| {
            let info = table.metadata(&occ.symbol);
            let documentation = info
                .map(|info| info.documentation.join("\n"))
                .filter(|docs| !docs.trim().is_empty());
            SymbolRecord {
                name: table.display_name(&occ.symbol),
                scip_symbol: occ.symbol.clone(),
                kind: info.map_or(SymbolKind::Unknown, |info| {
                    kind::resolve(info.kind, &info.documentation)
                }),
                span: occ.range,
                documentation,
                package: symbol::extract_package(&occ.symbol).map(|package| package.name),
                is_local: symbol::is_local(&occ.symbol),
            }
        })
        .collect();

    FileRecord {
        path: doc.relative_path.clone(),
        language: language_tag(&doc.language, &doc.relative_path),
        mtime: file_mtime(project_root, &doc.relative_path),
        symbols,
    }
}

/// Write documents in batches of `batch_size`.
pub(crate) fn write_batches(
    store: &Store,
    docs: &[&Document],
    table: &SymbolTable<'_>,
    project_root: &Path,
    batch_size: usize,
    indexed_at: i64,
) -> Result<BatchOutcome> {
    let mut outcome = BatchOutcome::default();

    for (batch_no, chunk) in docs.chunks(batch_size.max(1)).enumerate() {
        let records: Vec<FileRecord> = chunk
            .iter()
            .map(|doc| document_record(doc, table, project_root))
            .collect();
        let errors = store.write_files(&records, indexed_at)?;

        outcome.written += records.len() - errors.len();
        outcome.batches += 1;
        debug!(
            batch = batch_no + 1,
            documents = records.len(),
            failed = errors.len(),
            "Committed batch"
        );
        outcome.errors.extend(errors);
    }

    Ok(outcome)
}

/// Recompute outgoing edges for `paths` from the symbol table.
///
/// Targets that have no file row (filtered, failed, or unknown) are skipped.
pub(crate) fn recompute_dependencies(
    store: &Store,
    table: &SymbolTable<'_>,
    paths: &BTreeSet<String>,
    file_ids: &HashMap<String, FileId>,
) -> Result<usize> {
    let mut sources = Vec::with_capacity(paths.len());
    let mut edges = Vec::new();

    for path in paths {
        let (Some(&from), Some(doc)) = (file_ids.get(path), table.document(path)) else {
            continue;
        };
        sources.push(from);

        for (target, names) in table.file_dependencies(doc) {
            let Some(&to) = file_ids.get(target) else {
                trace!(from = %path, to = %target, "Dependency target not stored, skipping");
                continue;
            };
            edges.push(DependencyRecord {
                from,
                to,
                symbols: names.into_iter().collect(),
            });
        }
    }

    store.replace_dependencies(&sources, &edges)
}

/// Recompute usage rows for `paths`.
///
/// Each non-definition, non-local occurrence resolving through
/// `symbol_index` yields one row.
pub(crate) fn recompute_references(
    store: &Store,
    table: &SymbolTable<'_>,
    paths: &BTreeSet<String>,
    file_ids: &HashMap<String, FileId>,
    symbol_index: &HashMap<String, SymbolId>,
) -> Result<usize> {
    let mut files = Vec::with_capacity(paths.len());
    let mut references = Vec::new();

    for path in paths {
        let (Some(&file_id), Some(doc)) = (file_ids.get(path), table.document(path)) else {
            continue;
        };
        files.push(file_id);

        references.extend(
            doc.occurrences
                .iter()
                .filter(|occ| !occ.is_definition() && !symbol::is_local(&occ.symbol))
                .filter_map(|occ| {
                    symbol_index.get(&occ.symbol).map(|&symbol_id| ReferenceRecord {
                        symbol_id,
                        file_id,
                        line: occ.range.start_line,
                    })
                }),
        );
    }

    store.replace_references(&files, &references)
}

/// First-seen package details for every package named by a definition.
pub(crate) fn package_refs(docs: &[&Document]) -> HashMap<String, PackageRef> {
    let mut refs: HashMap<String, PackageRef> = HashMap::new();
    for occ in docs
        .iter()
        .flat_map(|doc| doc.occurrences.iter())
        .filter(|occ| occ.is_definition())
    {
        if let Some(package) = symbol::extract_package(&occ.symbol) {
            refs.entry(package.name.clone()).or_insert(package);
        }
    }
    refs
}
