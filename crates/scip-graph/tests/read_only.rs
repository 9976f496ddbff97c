//! The query engine must never modify the store.

mod common;

use common::{IndexBuilder, Project};
use rstest::rstest;
use scip_graph::db::Store;
use scip_graph::graph::{FileGraphOps, SqlFileGraph};
use scip_graph::pipeline::{ConvertOptions, convert};
use scip_graph::{Error, QueryError};

fn converted() -> Project {
    let project = Project::new();
    project.write_index(
        IndexBuilder::new()
            .file("src/a.ts", |d| d.defines("A").uses("src/b.ts", "B"))
            .file("src/b.ts", |d| d.defines("B")),
    );
    convert(
        &project.index,
        &project.db,
        project.root(),
        &ConvertOptions::default(),
    )
    .expect("conversion should succeed");
    project
}

#[rstest]
#[case::insert("INSERT INTO metadata (key, value) VALUES ('x', 'y')")]
#[case::update("UPDATE files SET symbol_count = 99")]
#[case::delete("DELETE FROM dependencies")]
#[case::drop("DROP TABLE symbols")]
#[case::create("CREATE TABLE evil (id INTEGER)")]
#[case::lowercase("delete from files")]
#[case::leading_comment("/* just reading */ DELETE FROM files")]
#[case::line_comment("-- select\nUPDATE files SET language = 'x'")]
#[case::cte("WITH doomed AS (SELECT id FROM files) DELETE FROM files WHERE id IN doomed")]
#[case::replace("REPLACE INTO metadata (key, value) VALUES ('last_mode', 'x')")]
#[case::trailing_write("SELECT 1; DELETE FROM files")]
#[case::write_between_reads("SELECT 1; UPDATE files SET symbol_count = 0; SELECT 2")]
fn writes_are_rejected(#[case] sql: &str) {
    let project = converted();
    let before = Store::open(&project.db).unwrap().totals().unwrap();
    let graph = SqlFileGraph::open(&project.db).unwrap();

    let err = graph.query(sql).unwrap_err();

    assert!(
        matches!(err, Error::WriteRejected(_)),
        "expected WriteRejected for {sql:?}, got {err:?}"
    );
    assert_eq!(Store::open(&project.db).unwrap().totals().unwrap(), before);
}

#[test]
fn reads_still_work_after_a_rejected_write() {
    let project = converted();
    let graph = SqlFileGraph::open(&project.db).unwrap();

    assert!(graph.query("DELETE FROM files").is_err());

    let rows = graph.query("SELECT COUNT(*) AS n FROM files").unwrap();
    assert_eq!(rows.columns, vec!["n"]);
    assert_eq!(rows.rows[0][0], serde_json::json!(2));
}

#[test]
fn cte_reads_are_allowed() {
    let project = converted();
    let graph = SqlFileGraph::open(&project.db).unwrap();

    let rows = graph
        .query(
            "WITH targets AS (SELECT to_file_id FROM dependencies) \
             SELECT path FROM files WHERE id IN targets ORDER BY path",
        )
        .unwrap();

    assert_eq!(rows.rows, vec![vec![serde_json::json!("src/b.ts")]]);
}

#[test]
fn several_reads_in_one_call_are_invalid() {
    let project = converted();
    let graph = SqlFileGraph::open(&project.db).unwrap();

    let err = graph.query("SELECT 1; SELECT 2").unwrap_err();
    assert!(matches!(err, Error::Query(QueryError::InvalidArgument(_))));
}

#[test]
fn trailing_semicolon_and_comment_are_accepted() {
    let project = converted();
    let graph = SqlFileGraph::open(&project.db).unwrap();

    let rows = graph.query("SELECT COUNT(*) FROM files; -- how many").unwrap();
    assert_eq!(rows.rows, vec![vec![serde_json::json!(2)]]);
}

#[rstest]
#[case::blank("   ")]
#[case::comment_only("-- nothing to run")]
fn empty_sql_is_invalid_argument(#[case] sql: &str) {
    let project = converted();
    let graph = SqlFileGraph::open(&project.db).unwrap();

    let err = graph.query(sql).unwrap_err();
    assert!(matches!(err, Error::Query(QueryError::InvalidArgument(_))));
}

#[test]
fn opening_a_missing_store_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = SqlFileGraph::open(&dir.path().join("missing.db"));
    assert!(matches!(result, Err(Error::StoreOpen { .. })));
}
