#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//! End-to-end runs over fixture directories on disk
//!
//! Each test lays out `.sql` / `.json` pairs in a temporary directory and
//! drives them through discovery and execution against a mock connection.

use std::fs;
use std::path::Path;

use tdsfdw_common::prompt::{MemorySink, MessageLevel};
use tdsfdw_testing_framework::prelude::*;
use tempfile::TempDir;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn write_fixture(dir: &Path, name: &str, sql: &str, desc: &str, min: &str, max: &str) {
    fs::write(dir.join(format!("{}.sql", name)), sql).unwrap();
    fs::write(
        dir.join(format!("{}.json", name)),
        format!(
            r#"{{
  "test_desc": "{}",
  "server": {{
    "version": {{
      "min": "{}",
      "max": "{}"
    }}
  }}
}}"#,
            desc, min, max
        ),
    )
    .unwrap();
}

fn pattern(dir: &TempDir) -> String {
    format!("{}/*.sql", dir.path().display())
}

fn run(dir: &TempDir, conn: &mut MockConnection, placeholders: PlaceholderMap) -> (Result<RunResult>, MemorySink) {
    let config = HarnessConfig::new(pattern(dir), placeholders);
    let mut sink = MemorySink::new();
    let result = run_suite(&config, conn, &mut sink);
    (result, sink)
}

#[test]
fn test_all_fixtures_succeed() {
    init_logger();
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path(), "001_create", "CREATE TABLE t (id int);", "Create table", "", "");
    write_fixture(dir.path(), "002_insert", "INSERT INTO t VALUES (1);", "Insert row", "9.2", "");
    write_fixture(dir.path(), "003_select", "SELECT * FROM t;", "Select rows", "", "13");

    let mut conn = MockConnection::new(DbFamily::PostgreSql, "12.3");
    let (result, sink) = run(&dir, &mut conn, PlaceholderMap::new());
    let result = result.unwrap();

    assert_eq!((result.total(), result.ok(), result.errors()), (3, 3, 0));
    assert_eq!(
        conn.committed(),
        [
            "CREATE TABLE t (id int);",
            "INSERT INTO t VALUES (1);",
            "SELECT * FROM t;"
        ]
    );
    assert_eq!(
        sink.messages(MessageLevel::Info),
        vec![
            "001: Testing Create table",
            "002: Testing Insert row",
            "003: Testing Select rows"
        ]
    );
}

#[test]
fn test_fixture_above_server_version_is_skipped() {
    init_logger();
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path(), "001_a", "SELECT 1;", "First", "", "");
    write_fixture(dir.path(), "002_future", "SELECT future();", "Future", "99.0", "");
    write_fixture(dir.path(), "003_b", "SELECT 3;", "Third", "", "");

    let mut conn = MockConnection::new(DbFamily::PostgreSql, "12.3");
    let (result, _) = run(&dir, &mut conn, PlaceholderMap::new());
    let result = result.unwrap();

    assert_eq!((result.total(), result.ok(), result.errors()), (2, 2, 0));
    assert!(conn.executions().iter().all(|e| e.sql != "SELECT future();"));
}

#[test]
fn test_fixture_below_max_version_is_skipped() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path(), "001_old", "SELECT old();", "Old servers only", "", "9.6");
    write_fixture(dir.path(), "002_any", "SELECT 2;", "Any server", "", "");

    let mut conn = MockConnection::new(DbFamily::PostgreSql, "12.3");
    let (result, _) = run(&dir, &mut conn, PlaceholderMap::new());
    let result = result.unwrap();
    assert_eq!((result.total(), result.ok()), (1, 1));
}

#[test]
fn test_prefix_bounds_with_distribution_suffix() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path(), "001_ten", "SELECT 10;", "Ten only", "10", "10");

    let mut conn = MockConnection::new(DbFamily::PostgreSql, "10.2 (Ubuntu 10.2-1.pgdg14.04+1)");
    let (result, _) = run(&dir, &mut conn, PlaceholderMap::new());
    assert_eq!(result.unwrap().ok(), 1);
}

#[test]
fn test_mssql_three_part_bounds() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path(), "001_2019", "SELECT 1;", "SQL Server 2019+", "15.0.2000", "");
    write_fixture(dir.path(), "002_2022", "SELECT 2;", "SQL Server 2022+", "16.0", "");

    let mut conn = MockConnection::new(DbFamily::MsSql, "15.0.2000.5");
    let (result, _) = run(&dir, &mut conn, PlaceholderMap::new());
    let result = result.unwrap();
    assert_eq!((result.total(), result.ok()), (1, 1));
    assert_eq!(conn.scalar_queries(), [DbFamily::MsSql.version_query()]);
}

#[test]
fn test_schema_placeholder_is_replaced_everywhere() {
    let dir = TempDir::new().unwrap();
    write_fixture(
        dir.path(),
        "001_schema",
        "CREATE TABLE @SCHEMANAME.t (id int);\nINSERT INTO @SCHEMANAME.t VALUES (1);",
        "Schema qualified table",
        "",
        "",
    );

    let placeholders: PlaceholderMap = [("@SCHEMANAME", "public")].into_iter().collect();
    let mut conn = MockConnection::new(DbFamily::MsSql, "14.0.3000.1");
    let (result, _) = run(&dir, &mut conn, placeholders);

    assert_eq!(result.unwrap().ok(), 1);
    assert_eq!(
        conn.committed(),
        ["CREATE TABLE public.t (id int);\nINSERT INTO public.t VALUES (1);"]
    );
}

#[test]
fn test_database_error_is_counted_and_rolled_back() {
    init_logger();
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path(), "001_create", "CREATE TABLE t (id int);", "Create", "", "");
    write_fixture(dir.path(), "002_broken", "INSERT INTO missing VALUES (1);", "Broken insert", "", "");
    write_fixture(dir.path(), "003_select", "SELECT * FROM t;", "Select", "", "");

    let mut conn = MockConnection::new(DbFamily::PostgreSql, "12.3").fail_on(
        "missing",
        MockError::new("42P01", "relation \"missing\" does not exist")
            .with_field("severity", "ERROR"),
    );
    let (result, sink) = run(&dir, &mut conn, PlaceholderMap::new());
    let result = result.unwrap();

    assert_eq!((result.total(), result.ok(), result.errors()), (3, 2, 1));
    assert_eq!(conn.rolled_back(), ["INSERT INTO missing VALUES (1);"]);

    // Nothing from the failed fixture leaks into the next one
    let next = &conn.executions()[2];
    assert_eq!(next.sql, "SELECT * FROM t;");
    assert!(next.inherited.is_empty());

    let fixture_path = dir.path().join("002_broken.sql");
    assert!(sink.contains(
        MessageLevel::Error,
        &format!("Error running Broken insert ({})", fixture_path.display())
    ));
    assert!(sink.contains(MessageLevel::Error, "42P01"));
    assert!(sink.contains(MessageLevel::Error, "severity: ERROR"));

    let mut report = MemorySink::new();
    print_report(&mut report, &result);
    assert!(report.contains(MessageLevel::Error, " ERROR: 1"));
}

#[test]
fn test_missing_sidecar_aborts_before_execution() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path(), "001_ok", "SELECT 1;", "Fine", "", "");
    fs::write(dir.path().join("002_orphan.sql"), "SELECT 2;").unwrap();

    let mut conn = MockConnection::new(DbFamily::PostgreSql, "12.3");
    let (result, _) = run(&dir, &mut conn, PlaceholderMap::new());

    assert!(matches!(result, Err(HarnessError::MissingMetadata { .. })));
    assert!(conn.executions().is_empty());
}

#[test]
fn test_invalid_sidecar_aborts_before_execution() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("001_bad.sql"), "SELECT 1;").unwrap();
    fs::write(dir.path().join("001_bad.json"), r#"{"test_desc": "no server key"}"#).unwrap();

    let mut conn = MockConnection::new(DbFamily::PostgreSql, "12.3");
    let (result, _) = run(&dir, &mut conn, PlaceholderMap::new());

    assert!(matches!(result, Err(HarnessError::InvalidMetadata { .. })));
    assert!(conn.executions().is_empty());
}

#[test]
fn test_malformed_sidecar_version_names_the_file() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path(), "001_bad", "SELECT 1;", "Bad bound", "v9", "");

    let mut conn = MockConnection::new(DbFamily::PostgreSql, "12.3");
    let (result, _) = run(&dir, &mut conn, PlaceholderMap::new());

    let err = result.unwrap_err();
    assert!(matches!(err, HarnessError::MalformedVersion { .. }));
    assert!(err.to_string().contains("001_bad.json"));
}

#[test]
fn test_non_matching_files_are_ignored() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path(), "001_a", "SELECT 1;", "A", "", "");
    fs::write(dir.path().join("README.md"), "not a fixture").unwrap();
    fs::create_dir(dir.path().join("002_dir.sql")).unwrap();

    let fixtures = discover(&pattern(&dir), DbFamily::PostgreSql).unwrap();
    assert_eq!(fixtures.len(), 1);
    assert_eq!(fixtures[0].identifier(), "001");
    assert_eq!(fixtures[0].description(), "A");
}

#[test]
fn test_empty_directory_runs_nothing() {
    let dir = TempDir::new().unwrap();
    let mut conn = MockConnection::new(DbFamily::PostgreSql, "12.3");
    let (result, sink) = run(&dir, &mut conn, PlaceholderMap::new());
    assert_eq!(result.unwrap(), RunResult::default());
    assert!(sink.entries().is_empty());
}
