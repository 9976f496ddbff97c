//! SCIP index → graph store conversion.
//!
//! [`convert`] decodes an index file and brings a store up to date with it,
//! either rebuilding everything (full) or touching only what changed
//! (incremental):
//!
//! 1. Decode (nothing is written if this fails), drop ignored documents
//! 2. Pick the mode: full if the store is empty or `force` is set
//! 3. Detect changed and deleted files (incremental only)
//! 4. Capture direct dependents of changed and deleted files, including
//!    files that only have usage rows pointing at them
//! 5. Under relaxed durability: clear or delete, write changed documents in
//!    batches, recompute edges and usages for changed files and captured
//!    dependents, refresh counters, aggregate packages, write metadata
//! 6. `ANALYZE` after a full rebuild
//!
//! Dependents of dependents are not revisited; their edges stay as they
//! were until they change themselves.

mod batch;
pub mod changes;

pub use changes::{ChangeDetection, ChangeSet, ChangeSource, GitChanges, MtimeChanges};

use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::time::Instant;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::{debug, info, warn};

use crate::db::{Store, metadata};
use crate::error::{DocumentError, Error, Result};
use crate::resolver::SymbolTable;
use crate::scip::{self, Document, ScipIndex};
use crate::types::{RunMode, RunStats};

/// Documents written per transaction unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Options for a conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Rebuild everything even if the store already has files
    pub force: bool,
    /// Gitignore-style patterns; matching documents are not converted
    pub ignore_patterns: Vec<String>,
    /// How modified files are found on incremental runs
    pub change_detection: ChangeDetection,
    /// Documents written per transaction
    pub batch_size: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            force: false,
            ignore_patterns: Vec::new(),
            change_detection: ChangeDetection::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl ConvertOptions {
    /// Force a full rebuild.
    #[must_use]
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Set ignore patterns (gitignore syntax).
    #[must_use]
    pub fn with_ignore_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Choose the change detection strategy.
    #[must_use]
    pub fn with_change_detection(mut self, change_detection: ChangeDetection) -> Self {
        self.change_detection = change_detection;
        self
    }

    /// Set the number of documents written per transaction.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

/// Convert a SCIP index file into the store at `store_path`.
///
/// The index is decoded before the store is opened, so a malformed index
/// leaves the store untouched.
pub fn convert(
    index_path: &Path,
    store_path: &Path,
    project_root: &Path,
    options: &ConvertOptions,
) -> Result<RunStats> {
    let start = Instant::now();
    let index = scip::decode_file(index_path)?;
    let store = Store::open(store_path)?;
    run(index, &store, project_root, options, start)
}

/// Convert an already decoded index into an open store.
pub fn convert_index(
    index: ScipIndex,
    store: &Store,
    project_root: &Path,
    options: &ConvertOptions,
) -> Result<RunStats> {
    run(index, store, project_root, options, Instant::now())
}

fn run(
    index: ScipIndex,
    store: &Store,
    project_root: &Path,
    options: &ConvertOptions,
    start: Instant,
) -> Result<RunStats> {
    if options.batch_size == 0 {
        return Err(Error::Config("batch size must be at least 1".to_string()));
    }

    let matcher = build_ignore(project_root, &options.ignore_patterns)?;
    let mut errors = Vec::new();
    let index = filter_documents(index, &matcher, &mut errors);

    let mode = if options.force || store.file_count()? == 0 {
        RunMode::Full
    } else {
        RunMode::Incremental
    };
    info!(
        mode = %mode,
        documents = index.documents.len(),
        root = %project_root.display(),
        "Starting conversion"
    );

    let scanned: Vec<&str> = index
        .documents
        .iter()
        .map(|doc| doc.relative_path.as_str())
        .collect();
    let stored = store.file_mtimes()?;

    let changes = match mode {
        RunMode::Full => ChangeSet {
            changed: scanned.iter().map(|path| (*path).to_string()).collect(),
            deleted: {
                let scanned: HashSet<&str> = scanned.iter().copied().collect();
                let mut deleted: Vec<String> = stored
                    .keys()
                    .filter(|path| !scanned.contains(path.as_str()))
                    .cloned()
                    .collect();
                deleted.sort();
                deleted
            },
        },
        RunMode::Incremental => {
            let last_commit = store.get_metadata(metadata::LAST_COMMIT)?;
            let source = options.change_detection.source(last_commit);
            changes::detect_changes(source.as_ref(), project_root, &scanned, &stored)?
        }
    };

    // Dependents are read before anything is deleted so their edges and
    // usages pointing into changed or deleted files can be recomputed. Files
    // with usages but no edge (every name unusable) count as dependents too.
    let dependents: BTreeSet<String> = match mode {
        RunMode::Full => BTreeSet::new(),
        RunMode::Incremental => {
            let touched: Vec<String> = changes
                .changed
                .iter()
                .chain(&changes.deleted)
                .cloned()
                .collect();
            let mut dependents = store.dependents_of(&touched)?;
            dependents.extend(store.referencing_files(&touched)?);
            for path in &touched {
                dependents.remove(path);
            }
            dependents
        }
    };

    let written = store.with_relaxed_durability(|store| {
        apply_changes(store, &index, project_root, options, mode, &changes, &dependents, &mut errors)
    })?;

    if mode == RunMode::Full {
        store.analyze()?;
    }

    let totals = store.totals()?;
    let stats = RunStats {
        mode,
        total_files: totals.files,
        total_symbols: totals.symbols,
        changed_files: written,
        deleted_files: changes.deleted.len(),
        time_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        errors,
    };

    info!(
        mode = %stats.mode,
        files = stats.total_files,
        symbols = stats.total_symbols,
        changed = stats.changed_files,
        deleted = stats.deleted_files,
        errors = stats.errors.len(),
        time_ms = stats.time_ms,
        "Conversion complete"
    );

    Ok(stats)
}

/// All writes of one run. Returns the number of documents written.
#[allow(clippy::too_many_arguments)] // One call site; the run's full context
fn apply_changes(
    store: &Store,
    index: &ScipIndex,
    project_root: &Path,
    options: &ConvertOptions,
    mode: RunMode,
    changes: &ChangeSet,
    dependents: &BTreeSet<String>,
    errors: &mut Vec<DocumentError>,
) -> Result<usize> {
    match mode {
        RunMode::Full => store.clear_all()?,
        RunMode::Incremental => {
            let doomed: Vec<String> = changes
                .deleted
                .iter()
                .chain(&changes.changed)
                .cloned()
                .collect();
            store.delete_files(&doomed)?;
        }
    }

    let table = SymbolTable::build(index);
    let changed: HashSet<&str> = changes.changed.iter().map(String::as_str).collect();
    let to_write: Vec<&Document> = index
        .documents
        .iter()
        .filter(|doc| changed.contains(doc.relative_path.as_str()))
        .collect();

    let indexed_at = Store::now_ns()?;
    let outcome = batch::write_batches(
        store,
        &to_write,
        &table,
        project_root,
        options.batch_size,
        indexed_at,
    )?;
    debug!(
        written = outcome.written,
        batches = outcome.batches,
        failed = outcome.errors.len(),
        "Wrote changed documents"
    );
    errors.extend(outcome.errors);

    let file_ids = store.file_ids()?;
    let recompute: BTreeSet<String> = changes
        .changed
        .iter()
        .chain(dependents)
        .filter(|path| file_ids.contains_key(*path))
        .cloned()
        .collect();

    let edges = batch::recompute_dependencies(store, &table, &recompute, &file_ids)?;
    let symbol_index = store.symbol_index()?;
    let usages =
        batch::recompute_references(store, &table, &recompute, &file_ids, &symbol_index)?;
    debug!(
        files = recompute.len(),
        dependents = dependents.len(),
        edges,
        usages,
        "Recomputed dependencies and references"
    );

    store.refresh_counters()?;

    let (stored_packages, distinct_packages) = store.package_counts()?;
    if changes.is_empty() && stored_packages == distinct_packages {
        debug!(packages = stored_packages, "Packages unchanged, skipping rebuild");
    } else {
        let all_docs: Vec<&Document> = index.documents.iter().collect();
        store.rebuild_packages(&batch::package_refs(&all_docs))?;
    }

    write_metadata(store, index, project_root, mode)?;

    Ok(outcome.written)
}

fn write_metadata(
    store: &Store,
    index: &ScipIndex,
    project_root: &Path,
    mode: RunMode,
) -> Result<()> {
    let totals = store.totals()?;
    let mut entries = vec![
        (metadata::LAST_INDEXED, chrono::Utc::now().to_rfc3339()),
        (metadata::TOTAL_FILES, totals.files.to_string()),
        (metadata::TOTAL_SYMBOLS, totals.symbols.to_string()),
        (metadata::LAST_MODE, mode.as_str().to_string()),
    ];
    if let Some(tool) = &index.tool {
        entries.push((metadata::SCIP_TOOL, tool.name.clone()));
        entries.push((metadata::SCIP_TOOL_VERSION, tool.version.clone()));
    }
    if let Some(root) = &index.project_root {
        entries.push((metadata::PROJECT_ROOT, root.clone()));
    }
    if let Some(commit) = changes::head_commit(project_root) {
        entries.push((metadata::LAST_COMMIT, commit));
    }
    store.set_metadata(&entries)
}

fn build_ignore(project_root: &Path, patterns: &[String]) -> Result<Gitignore> {
    let mut builder = GitignoreBuilder::new(project_root);
    for pattern in patterns {
        builder
            .add_line(None, pattern)
            .map_err(|e| Error::Config(format!("invalid ignore pattern '{pattern}': {e}")))?;
    }
    builder
        .build()
        .map_err(|e| Error::Config(format!("failed to build ignore matcher: {e}")))
}

/// Drop ignored, unnamed, and repeated documents.
///
/// Unnamed and repeated documents are recorded as errors; the first document
/// with a given path wins.
fn filter_documents(
    mut index: ScipIndex,
    matcher: &Gitignore,
    errors: &mut Vec<DocumentError>,
) -> ScipIndex {
    let mut seen = HashSet::new();
    let mut ignored = 0usize;

    index.documents.retain(|doc| {
        if doc.relative_path.is_empty() {
            warn!("Skipping document with empty path");
            errors.push(DocumentError::empty_path());
            return false;
        }

        let path = Path::new(&doc.relative_path);
        if !path.has_root() && matcher.matched_path_or_any_parents(path, false).is_ignore() {
            ignored += 1;
            return false;
        }

        if !seen.insert(doc.relative_path.clone()) {
            warn!(path = %doc.relative_path, "Skipping repeated document path");
            errors.push(DocumentError::duplicate_path(&doc.relative_path));
            return false;
        }

        true
    });

    if ignored > 0 {
        debug!(ignored, "Dropped ignored documents");
    }

    index
}
