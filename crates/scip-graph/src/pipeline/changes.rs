//! Change detection for incremental runs.
//!
//! A [`ChangeSource`] decides which already-stored files changed on disk.
//! New files (in the scan but not the store) and deleted files (in the store
//! but not the scan) are determined the same way for every source by
//! [`detect_changes`].

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::process::Command;
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// Files to reconvert and files to drop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// New or modified files, in scan order
    pub changed: Vec<String>,
    /// Stored files absent from the scan, sorted
    pub deleted: Vec<String>,
}

impl ChangeSet {
    /// Whether nothing needs to be written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.deleted.is_empty()
    }
}

/// Strategy for spotting modified files.
pub trait ChangeSource {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Which of `candidates` (all present in the store) were modified.
    ///
    /// `stored` maps every stored path to its recorded modification time.
    fn modified(
        &self,
        project_root: &Path,
        candidates: &[&str],
        stored: &HashMap<String, i64>,
    ) -> Result<BTreeSet<String>>;
}

/// Which [`ChangeSource`] an incremental run uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDetection {
    /// Compare on-disk modification times with stored ones
    #[default]
    Mtime,
    /// Ask `git` which files changed since the last run's commit, falling
    /// back to mtimes
    Git,
}

impl ChangeDetection {
    /// The change source implementing this strategy.
    ///
    /// `last_commit` is the `HEAD` recorded by the previous run, if any.
    #[must_use]
    pub fn source(self, last_commit: Option<String>) -> Box<dyn ChangeSource> {
        match self {
            Self::Mtime => Box::new(MtimeChanges),
            Self::Git => Box::new(GitChanges::new(last_commit)),
        }
    }
}

impl std::str::FromStr for ChangeDetection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mtime" => Ok(Self::Mtime),
            "git" => Ok(Self::Git),
            other => Err(format!("unknown change detection '{other}' (expected mtime or git)")),
        }
    }
}

/// Compute the change set for a scan against the stored files.
pub fn detect_changes(
    source: &dyn ChangeSource,
    project_root: &Path,
    scanned: &[&str],
    stored: &HashMap<String, i64>,
) -> Result<ChangeSet> {
    let candidates: Vec<&str> = scanned
        .iter()
        .copied()
        .filter(|path| stored.contains_key(*path))
        .collect();
    let modified = source.modified(project_root, &candidates, stored)?;

    let changed: Vec<String> = scanned
        .iter()
        .filter(|path| !stored.contains_key(**path) || modified.contains(**path))
        .map(|path| (*path).to_string())
        .collect();

    let scanned_set: BTreeSet<&str> = scanned.iter().copied().collect();
    let mut deleted: Vec<String> = stored
        .keys()
        .filter(|path| !scanned_set.contains(path.as_str()))
        .cloned()
        .collect();
    deleted.sort();

    debug!(
        source = source.name(),
        scanned = scanned.len(),
        changed = changed.len(),
        deleted = deleted.len(),
        "Detected changes"
    );

    Ok(ChangeSet { changed, deleted })
}

/// Modification time of a project file in nanoseconds, or 0 if it can't be read.
#[must_use]
pub fn file_mtime(project_root: &Path, relative: &str) -> i64 {
    std::fs::metadata(project_root.join(relative))
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
        .and_then(|since| i64::try_from(since.as_nanos()).ok())
        .unwrap_or(0)
}

/// Files whose on-disk modification time is newer than the stored one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MtimeChanges;

impl ChangeSource for MtimeChanges {
    fn name(&self) -> &'static str {
        "mtime"
    }

    fn modified(
        &self,
        project_root: &Path,
        candidates: &[&str],
        stored: &HashMap<String, i64>,
    ) -> Result<BTreeSet<String>> {
        Ok(candidates
            .iter()
            .filter(|path| {
                let recorded = stored.get(**path).copied().unwrap_or(0);
                file_mtime(project_root, path) > recorded
            })
            .map(|path| (*path).to_string())
            .collect())
    }
}

/// Run `git` in `project_root` and return its stdout.
fn git(project_root: &Path, args: &[&str]) -> std::result::Result<String, String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(project_root)
        .output()
        .map_err(|e| format!("failed to run git: {e}"))?;
    if !output.status.success() {
        return Err(format!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// The commit `HEAD` points at, if `project_root` is inside a git repository
/// with at least one commit.
#[must_use]
pub fn head_commit(project_root: &Path) -> Option<String> {
    match git(project_root, &["rev-parse", "--verify", "HEAD"]) {
        Ok(out) => Some(out.trim().to_string()).filter(|commit| !commit.is_empty()),
        Err(reason) => {
            debug!(root = %project_root.display(), reason = %reason, "No git HEAD to record");
            None
        }
    }
}

/// Files `git` reports as changed since the commit the store was built from.
///
/// Covers commits made since then as well as staged, unstaged and untracked
/// changes. Uncommitted changes present at the last run are reported again.
/// Without a recorded commit, or when `git` fails, falls back to mtimes.
#[derive(Debug, Clone, Default)]
pub struct GitChanges {
    since: Option<String>,
}

impl GitChanges {
    /// Compare against `since`, the commit recorded by the previous run.
    #[must_use]
    pub fn new(since: Option<String>) -> Self {
        Self { since }
    }

    fn git_paths(&self, project_root: &Path) -> std::result::Result<BTreeSet<String>, String> {
        let since = self
            .since
            .as_deref()
            .ok_or_else(|| "no commit recorded by the previous run".to_string())?;

        let mut paths = BTreeSet::new();
        for args in [
            &["diff", "--name-only", "--relative", since][..],
            &["ls-files", "--others", "--exclude-standard"][..],
        ] {
            paths.extend(
                git(project_root, args)?
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string),
            );
        }
        Ok(paths)
    }
}

impl ChangeSource for GitChanges {
    fn name(&self) -> &'static str {
        "git"
    }

    fn modified(
        &self,
        project_root: &Path,
        candidates: &[&str],
        stored: &HashMap<String, i64>,
    ) -> Result<BTreeSet<String>> {
        match self.git_paths(project_root) {
            Ok(reported) => Ok(candidates
                .iter()
                .filter(|path| reported.contains(**path))
                .map(|path| (*path).to_string())
                .collect()),
            Err(reason) => {
                warn!(
                    root = %project_root.display(),
                    reason = %reason,
                    "git change detection unavailable, falling back to mtimes"
                );
                MtimeChanges.modified(project_root, candidates, stored)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    fn touch(root: &Path, relative: &str, at: SystemTime) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, b"x").unwrap();
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(at)
            .unwrap();
    }

    fn nanos(at: SystemTime) -> i64 {
        i64::try_from(at.duration_since(UNIX_EPOCH).unwrap().as_nanos()).unwrap()
    }

    #[test]
    fn new_and_deleted_files_are_detected_for_any_source() {
        let dir = tempfile::tempdir().unwrap();
        let stored = HashMap::from([("old.ts".to_string(), 0), ("kept.ts".to_string(), i64::MAX)]);

        let changes =
            detect_changes(&MtimeChanges, dir.path(), &["kept.ts", "new.ts"], &stored).unwrap();

        assert_eq!(changes.changed, vec!["new.ts"]);
        assert_eq!(changes.deleted, vec!["old.ts"]);
        assert!(!changes.is_empty());
    }

    #[test]
    fn mtime_newer_than_stored_counts_as_modified() {
        let dir = tempfile::tempdir().unwrap();
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        touch(dir.path(), "src/a.ts", base);
        touch(dir.path(), "src/b.ts", base + Duration::from_secs(60));

        let stored = HashMap::from([
            ("src/a.ts".to_string(), nanos(base)),
            ("src/b.ts".to_string(), nanos(base)),
        ]);

        let modified = MtimeChanges
            .modified(dir.path(), &["src/a.ts", "src/b.ts"], &stored)
            .unwrap();

        assert_eq!(modified.into_iter().collect::<Vec<_>>(), vec!["src/b.ts"]);
    }

    #[test]
    fn missing_file_has_zero_mtime() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(file_mtime(dir.path(), "nope.ts"), 0);
    }

    #[test]
    fn git_outside_a_repository_falls_back_to_mtimes() {
        let dir = tempfile::tempdir().unwrap();
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        touch(dir.path(), "a.ts", base + Duration::from_secs(5));
        let stored = HashMap::from([("a.ts".to_string(), nanos(base))]);

        let modified = GitChanges::new(Some("HEAD".to_string()))
            .modified(dir.path(), &["a.ts"], &stored)
            .unwrap();

        assert!(modified.contains("a.ts"));
    }

    fn run_git(root: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(root)
            .status()
            .unwrap();
        assert!(status.success(), "git {args:?} failed");
    }

    fn repo_with_commit() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        run_git(dir.path(), &["init", "-q"]);
        run_git(dir.path(), &["config", "user.email", "dev@example.com"]);
        run_git(dir.path(), &["config", "user.name", "Dev"]);
        run_git(dir.path(), &["config", "commit.gpgsign", "false"]);
        std::fs::write(dir.path().join("a.ts"), b"export class A {}").unwrap();
        std::fs::write(dir.path().join("b.ts"), b"export class B {}").unwrap();
        run_git(dir.path(), &["add", "."]);
        run_git(dir.path(), &["commit", "-q", "-m", "initial"]);
        dir
    }

    #[test]
    fn git_reports_files_committed_since_the_recorded_commit() {
        let dir = repo_with_commit();
        let recorded = head_commit(dir.path()).unwrap();

        std::fs::write(dir.path().join("a.ts"), b"export class A { b: B }").unwrap();
        run_git(dir.path(), &["commit", "-q", "-am", "edit a"]);
        assert_ne!(head_commit(dir.path()).as_deref(), Some(recorded.as_str()));

        // Mtimes say nothing changed, so only git can find the edit.
        let stored = HashMap::from([("a.ts".to_string(), i64::MAX), ("b.ts".to_string(), i64::MAX)]);
        let modified = GitChanges::new(Some(recorded))
            .modified(dir.path(), &["a.ts", "b.ts"], &stored)
            .unwrap();

        assert_eq!(modified.into_iter().collect::<Vec<_>>(), vec!["a.ts"]);
    }

    #[test]
    fn git_reports_uncommitted_and_untracked_files() {
        let dir = repo_with_commit();
        let recorded = head_commit(dir.path()).unwrap();

        std::fs::write(dir.path().join("b.ts"), b"export class B { x = 1 }").unwrap();
        std::fs::write(dir.path().join("c.ts"), b"export class C {}").unwrap();

        let stored = HashMap::from([
            ("a.ts".to_string(), i64::MAX),
            ("b.ts".to_string(), i64::MAX),
            ("c.ts".to_string(), i64::MAX),
        ]);
        let modified = GitChanges::new(Some(recorded))
            .modified(dir.path(), &["a.ts", "b.ts", "c.ts"], &stored)
            .unwrap();

        assert_eq!(modified.into_iter().collect::<Vec<_>>(), vec!["b.ts", "c.ts"]);
    }

    #[test]
    fn git_without_recorded_commit_falls_back_to_mtimes() {
        let dir = repo_with_commit();
        let stored = HashMap::from([("a.ts".to_string(), 0), ("b.ts".to_string(), i64::MAX)]);

        let modified = GitChanges::new(None)
            .modified(dir.path(), &["a.ts", "b.ts"], &stored)
            .unwrap();

        assert_eq!(modified.into_iter().collect::<Vec<_>>(), vec!["a.ts"]);
    }

    #[test]
    fn head_commit_outside_a_repository_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(head_commit(dir.path()), None);
    }

    #[test]
    fn change_detection_parses_names() {
        assert_eq!("git".parse::<ChangeDetection>().unwrap(), ChangeDetection::Git);
        assert_eq!("MTIME".parse::<ChangeDetection>().unwrap(), ChangeDetection::Mtime);
        assert!("svn".parse::<ChangeDetection>().is_err());
    }
}
