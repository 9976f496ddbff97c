//! SQL-based implementation of graph operations.
//!
//! Uses recursive CTEs for traversal, keeping all data in `SQLite`.

// SQLite stores every integer as i64. Counts and depths read here are never
// negative.
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use rusqlite::{Batch, Connection};
use rusqlite::types::ValueRef;
use tracing::{debug, trace};

use super::{
    ComplexitySort, CoupledPair, Cycle, DependencyPath, FileComplexity, FileGraphOps,
    IndexSummary, LeafFile, QueryRows, ReachableFile,
};
use crate::db::{self, ReadOnlyConnection, map_read_only_error, metadata};
use crate::error::{Error, QueryError, Result};
use crate::paths::{self, PathLookup};

/// Deepest search `find_path` attempts from each end.
pub const MAX_PATH_DEPTH: u32 = 10;

/// Edge direction for traversals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// Follow edges from dependent to dependency
    Forward,
    /// Follow edges from dependency to dependent
    Reverse,
}

impl Direction {
    /// Columns as (column matched against the current file, column to step to).
    fn columns(self) -> (&'static str, &'static str) {
        match self {
            Self::Forward => ("from_file_id", "to_file_id"),
            Self::Reverse => ("to_file_id", "from_file_id"),
        }
    }
}

/// SQL-based implementation of file graph operations.
///
/// Holds a [`ReadOnlyConnection`], so nothing issued through it can modify
/// the store.
pub struct SqlFileGraph {
    db: ReadOnlyConnection,
    project_root: Option<PathBuf>,
}

impl SqlFileGraph {
    /// Open the store at `db_path` for querying.
    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self {
            db: ReadOnlyConnection::open(db_path)?,
            project_root: None,
        })
    }

    /// Strip this prefix from absolute path arguments.
    #[must_use]
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    /// Location of the store on disk.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        self.db.path()
    }

    /// Resolve a user path to a stored file path.
    ///
    /// Directories and unknown paths become [`QueryError`]s carrying the
    /// candidates a caller can offer instead.
    pub fn resolve_path(&self, input: &str) -> Result<String> {
        let conn = self.db.lock()?;
        self.resolve_with(&conn, input)
    }

    /// Look a user path up without turning misses into errors.
    pub fn lookup(&self, input: &str) -> Result<PathLookup> {
        let conn = self.db.lock()?;
        let indexed = indexed_paths(&conn)?;
        Ok(paths::resolve(
            input,
            self.project_root.as_deref(),
            indexed.iter().map(String::as_str),
        ))
    }

    fn resolve_with(&self, conn: &Connection, input: &str) -> Result<String> {
        let indexed = indexed_paths(conn)?;
        let lookup = paths::resolve(
            input,
            self.project_root.as_deref(),
            indexed.iter().map(String::as_str),
        );
        let normalized = || paths::normalize(input, self.project_root.as_deref());

        match lookup {
            PathLookup::Found(path) => Ok(path),
            PathLookup::IsDirectory(candidates) => Err(QueryError::IsDirectory {
                path: normalized(),
                candidates,
            }
            .into()),
            PathLookup::Suggestions(suggestions) => Err(QueryError::FileNotFound {
                path: normalized(),
                suggestions,
            }
            .into()),
            PathLookup::NotFound => Err(QueryError::FileNotFound {
                path: normalized(),
                suggestions: Vec::new(),
            }
            .into()),
        }
    }

    fn traverse(&self, path: &str, depth: u32, direction: Direction) -> Result<Vec<ReachableFile>> {
        if depth == 0 {
            return Err(QueryError::InvalidArgument("depth must be at least 1".to_string()).into());
        }

        let conn = self.db.lock()?;
        let start = self.resolve_with(&conn, path)?;
        let reached = reach(&conn, &start, depth, direction)?;

        let mut files: Vec<ReachableFile> = reached
            .into_iter()
            .filter(|(_, depth)| *depth > 0)
            .map(|(path, depth)| ReachableFile { path, depth })
            .collect();
        files.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.path.cmp(&b.path)));

        debug!(start = %start, depth, ?direction, found = files.len(), "Traversed graph");
        Ok(files)
    }
}

impl FileGraphOps for SqlFileGraph {
    fn dependencies(&self, path: &str, depth: u32) -> Result<Vec<ReachableFile>> {
        self.traverse(path, depth, Direction::Forward)
    }

    fn dependents(&self, path: &str, depth: u32) -> Result<Vec<ReachableFile>> {
        self.traverse(path, depth, Direction::Reverse)
    }

    fn find_path(&self, from: &str, to: &str) -> Result<DependencyPath> {
        let conn = self.db.lock()?;
        let from = self.resolve_with(&conn, from)?;
        let to = self.resolve_with(&conn, to)?;

        if from == to {
            return Ok(DependencyPath::single(from));
        }

        for depth in 1..=MAX_PATH_DEPTH {
            let forward = reach(&conn, &from, depth, Direction::Forward)?;
            let backward = reach(&conn, &to, depth, Direction::Reverse)?;

            let meeting = forward
                .iter()
                .filter_map(|(node, ahead)| backward.get(node).map(|behind| (ahead + behind, node)))
                .min_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

            let Some((distance, middle)) = meeting else {
                trace!(depth, "No meeting point yet");
                continue;
            };

            let head = bfs_path(&conn, &from, middle, forward[middle])?;
            let tail = bfs_path(&conn, middle, &to, backward[middle])?;
            let (Some(mut files), Some(tail)) = (head, tail) else {
                return Err(Error::Internal(format!(
                    "failed to rebuild path {from} -> {middle} -> {to}"
                )));
            };
            files.extend(tail.into_iter().skip(1));

            debug!(from = %from, to = %to, distance, depth, "Found path");
            return DependencyPath::new(files)
                .ok_or_else(|| Error::Internal("rebuilt path is empty".to_string()));
        }

        Err(QueryError::NoPath {
            from,
            to,
            max_depth: MAX_PATH_DEPTH,
        }
        .into())
    }

    fn two_node_cycles(&self, limit: usize) -> Result<Vec<Cycle>> {
        if limit == 0 {
            return Err(QueryError::InvalidArgument("limit must be at least 1".to_string()).into());
        }

        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(
            "SELECT fa.path, fb.path
             FROM dependencies d1
             JOIN dependencies d2
               ON d2.from_file_id = d1.to_file_id AND d2.to_file_id = d1.from_file_id
             JOIN files fa ON fa.id = d1.from_file_id
             JOIN files fb ON fb.id = d1.to_file_id
             WHERE fa.path < fb.path
             ORDER BY fa.path, fb.path
             LIMIT ?1",
        )?;

        let cycles = stmt
            .query_map([i64::try_from(limit).unwrap_or(i64::MAX)], |row| {
                Ok(Cycle::pair(row.get(0)?, row.get(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(cycles)
    }

    fn coupling(&self, threshold: u64) -> Result<Vec<CoupledPair>> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(
            "SELECT fa.path, fb.path, d1.symbol_count, d2.symbol_count
             FROM dependencies d1
             JOIN dependencies d2
               ON d2.from_file_id = d1.to_file_id AND d2.to_file_id = d1.from_file_id
             JOIN files fa ON fa.id = d1.from_file_id
             JOIN files fb ON fb.id = d1.to_file_id
             WHERE fa.path < fb.path
               AND d1.symbol_count + d2.symbol_count >= ?1
             ORDER BY d1.symbol_count + d2.symbol_count DESC, fa.path, fb.path",
        )?;

        let pairs = stmt
            .query_map([i64::try_from(threshold).unwrap_or(i64::MAX)], |row| {
                let a_to_b = row.get::<_, i64>(2)? as u64;
                let b_to_a = row.get::<_, i64>(3)? as u64;
                Ok(CoupledPair {
                    file_a: row.get(0)?,
                    file_b: row.get(1)?,
                    a_to_b,
                    b_to_a,
                    total: a_to_b + b_to_a,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(pairs)
    }

    fn complexity(&self, sort: ComplexitySort, limit: usize) -> Result<Vec<FileComplexity>> {
        if limit == 0 {
            return Err(QueryError::InvalidArgument("limit must be at least 1".to_string()).into());
        }

        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(
            "SELECT path, symbol_count, dependency_count, dependent_count FROM files",
        )?;

        let mut files = stmt
            .query_map([], |row| {
                Ok(FileComplexity::new(
                    row.get(0)?,
                    row.get::<_, i64>(1)? as u64,
                    row.get::<_, i64>(2)? as u64,
                    row.get::<_, i64>(3)? as u64,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        files.sort_by(|a, b| {
            let primary = match sort {
                ComplexitySort::Complexity => b.score.cmp(&a.score),
                ComplexitySort::Symbols => b.symbol_count.cmp(&a.symbol_count),
                ComplexitySort::Stability => b.stability.total_cmp(&a.stability),
            };
            primary.then_with(|| a.path.cmp(&b.path))
        });
        files.truncate(limit);

        Ok(files)
    }

    fn leaves(&self, max_dependents: u64) -> Result<Vec<LeafFile>> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(
            "SELECT path, dependent_count, symbol_count
             FROM files
             WHERE dependent_count <= ?1
             ORDER BY dependent_count, path",
        )?;

        let leaves = stmt
            .query_map([i64::try_from(max_dependents).unwrap_or(i64::MAX)], |row| {
                Ok(LeafFile {
                    path: row.get(0)?,
                    dependent_count: row.get::<_, i64>(1)? as u64,
                    symbol_count: row.get::<_, i64>(2)? as u64,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .filter(|leaf| !is_test_file(&leaf.path) && !is_config_file(&leaf.path))
            .collect();

        Ok(leaves)
    }

    fn summary(&self) -> Result<IndexSummary> {
        let conn = self.db.lock()?;
        Ok(IndexSummary {
            metadata: metadata::read_all(&conn)?,
            totals: db::totals(&conn)?,
        })
    }

    fn query(&self, sql: &str) -> Result<QueryRows> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(QueryError::InvalidArgument("empty SQL".to_string()).into());
        }

        let conn = self.db.lock()?;
        check_single_read(&conn, sql)?;
        let mut stmt = conn.prepare(sql).map_err(|e| map_read_only_error(e, sql))?;

        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let column_count = columns.len();

        let mut rows = Vec::new();
        let mut raw_rows = stmt.raw_query();
        while let Some(row) = raw_rows.next().map_err(|e| map_read_only_error(e, sql))? {
            let mut values = Vec::with_capacity(column_count);
            for idx in 0..column_count {
                values.push(json_value(row.get_ref(idx)?));
            }
            rows.push(values);
        }

        debug!(columns = column_count, rows = rows.len(), "Ran ad hoc query");
        Ok(QueryRows { columns, rows })
    }
}

/// Reject `sql` unless it is exactly one statement that does not write.
///
/// Every statement is compiled, so a write after a read is still caught.
fn check_single_read(conn: &Connection, sql: &str) -> Result<()> {
    let mut batch = Batch::new(conn, sql);
    let mut statements = 0usize;
    while let Some(stmt) = batch.next().map_err(|e| map_read_only_error(e, sql))? {
        if !stmt.readonly() {
            return Err(Error::WriteRejected(sql.to_string()));
        }
        statements += 1;
    }

    match statements {
        1 => Ok(()),
        0 => Err(QueryError::InvalidArgument("no SQL statement".to_string()).into()),
        n => Err(QueryError::InvalidArgument(format!("expected one statement, found {n}")).into()),
    }
}

fn indexed_paths(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare_cached("SELECT path FROM files ORDER BY path")?;
    let paths = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(paths)
}

/// Every file within `depth` hops of `start`, with its minimum hop count.
///
/// `start` itself is included at depth 0.
fn reach(
    conn: &Connection,
    start: &str,
    depth: u32,
    direction: Direction,
) -> Result<HashMap<String, u32>> {
    let (current, next) = direction.columns();
    let sql = format!(
        "WITH RECURSIVE reach(file_id, depth) AS (
            SELECT id, 0 FROM files WHERE path = ?1

            UNION

            SELECT d.{next}, r.depth + 1
            FROM dependencies d
            JOIN reach r ON d.{current} = r.file_id
            WHERE r.depth < ?2
        )
        SELECT f.path, MIN(r.depth)
        FROM reach r
        JOIN files f ON f.id = r.file_id
        GROUP BY f.id"
    );

    let mut stmt = conn.prepare_cached(&sql)?;
    let reached = stmt
        .query_map(rusqlite::params![start, depth], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u32))
        })?
        .collect::<std::result::Result<HashMap<_, _>, _>>()?;

    Ok(reached)
}

/// Direct dependencies of `path`, sorted.
fn neighbors(conn: &Connection, path: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT t.path
         FROM dependencies d
         JOIN files f ON f.id = d.from_file_id
         JOIN files t ON t.id = d.to_file_id
         WHERE f.path = ?1
         ORDER BY t.path",
    )?;
    let paths = stmt
        .query_map([path], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(paths)
}

/// Shortest forward path from `from` to `to` using at most `max_hops` edges.
fn bfs_path(conn: &Connection, from: &str, to: &str, max_hops: u32) -> Result<Option<Vec<String>>> {
    if from == to {
        return Ok(Some(vec![from.to_string()]));
    }

    let mut parent: HashMap<String, String> = HashMap::new();
    let mut seen: HashSet<String> = HashSet::from([from.to_string()]);
    let mut queue = VecDeque::from([(from.to_string(), 0u32)]);

    while let Some((node, hops)) = queue.pop_front() {
        if hops == max_hops {
            continue;
        }
        for next in neighbors(conn, &node)? {
            if !seen.insert(next.clone()) {
                continue;
            }
            parent.insert(next.clone(), node.clone());
            if next == to {
                let mut path = vec![next];
                while let Some(prev) = path.last().and_then(|last| parent.get(last)) {
                    path.push(prev.clone());
                }
                path.reverse();
                return Ok(Some(path));
            }
            queue.push_back((next, hops + 1));
        }
    }

    Ok(None)
}

fn json_value(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        ValueRef::Text(bytes) => serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => serde_json::Value::from(bytes.to_vec()),
    }
}

const TEST_DIRS: &[&str] = &["test", "tests", "__tests__", "__mocks__", "spec", "specs", "testdata"];

const CONFIG_NAMES: &[&str] = &[
    "package.json",
    "package-lock.json",
    "tsconfig.json",
    "jsconfig.json",
    "cargo.toml",
    "pyproject.toml",
    "setup.py",
    "setup.cfg",
    "go.mod",
    "pom.xml",
    "build.gradle",
    "makefile",
    "dockerfile",
];

/// Whether `path` looks like a test file by naming convention.
#[must_use]
pub fn is_test_file(path: &str) -> bool {
    let lower = path.to_lowercase();
    let mut segments: Vec<&str> = lower.split('/').collect();
    let Some(name) = segments.pop() else {
        return false;
    };

    if segments.iter().any(|dir| TEST_DIRS.contains(dir)) {
        return true;
    }

    let stem = name.split('.').next().unwrap_or(name);
    name.contains(".test.")
        || name.contains(".spec.")
        || stem.starts_with("test_")
        || stem.ends_with("_test")
        || stem.ends_with("_spec")
        || (name.ends_with(".java") && stem.len() > 4 && stem.ends_with("test"))
}

/// Whether `path` looks like a build or tool configuration file.
#[must_use]
pub fn is_config_file(path: &str) -> bool {
    let lower = path.to_lowercase();
    let name = lower.rsplit('/').next().unwrap_or(&lower);

    CONFIG_NAMES.contains(&name)
        || name.starts_with('.')
        || name.contains(".config.")
        || name.contains(".conf.")
        || name.starts_with("tsconfig.")
}
