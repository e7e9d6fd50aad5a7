//! DuckDB-backed tests for motherduck-mcp
//!
//! These run against the bundled DuckDB with in-memory and temp-file
//! databases. MotherDuck tests need a token and network access:
//!
//! ```bash
//! # Local DuckDB tests
//! cargo test -p motherduck-mcp --test duckdb_engine
//!
//! # MotherDuck tests
//! motherduck_token=... cargo test -p motherduck-mcp --test duckdb_engine -- --ignored
//! ```

use std::path::Path;
use std::sync::Arc;

use mcp_common::{EmbeddableError, EmbeddableMcp};
use motherduck_mcp::{DuckDbEngine, MotherDuckMcpServer, ResultFormat, ServerConfig, ServerState};
use serde_json::json;
use tempfile::TempDir;

async fn start(config: ServerConfig) -> MotherDuckMcpServer {
    let engine = Arc::new(DuckDbEngine::new(config.home_dir.clone()));
    let state = ServerState::start(&config, engine)
        .await
        .expect("server should start");
    MotherDuckMcpServer::new(Arc::new(state))
}

async fn query(server: &MotherDuckMcpServer, sql: &str) -> Result<String, EmbeddableError> {
    server.call_tool_text("query", json!({ "sql": sql })).await
}

fn file_config(path: &Path, read_only: bool) -> ServerConfig {
    ServerConfig {
        db_path: path.to_string_lossy().to_string(),
        read_only,
        ..Default::default()
    }
}

/// Create a database file with a small `ducks` table
async fn seed(path: &Path) {
    let server = start(file_config(path, false)).await;
    query(&server, "CREATE TABLE ducks (id INTEGER, name VARCHAR)")
        .await
        .unwrap();
    query(&server, "INSERT INTO ducks VALUES (1, 'mallard'), (2, 'teal')")
        .await
        .unwrap();
    server.state().shutdown().await.unwrap();
}

// ============================================================================
// In-memory
// ============================================================================

#[tokio::test]
async fn in_memory_state_persists_between_queries() {
    let server = start(ServerConfig::default()).await;

    query(&server, "CREATE TABLE t AS SELECT * FROM range(3) r(n)")
        .await
        .unwrap();
    let text = query(&server, "SELECT count(*) AS total FROM t").await.unwrap();

    assert_eq!(text, "| total |\n| --- |\n| 3 |");
}

#[tokio::test]
async fn reselecting_memory_keeps_tables() {
    let server = start(ServerConfig::default()).await;

    query(&server, "CREATE TABLE t AS SELECT 1 AS x").await.unwrap();
    server
        .call_tool_text("set_database", json!({ "target": ":memory:" }))
        .await
        .unwrap();

    assert_eq!(query(&server, "SELECT * FROM t").await.unwrap(), "| x |\n| --- |\n| 1 |");
}

#[tokio::test]
async fn column_types_in_headers() {
    let config = ServerConfig {
        show_column_types: true,
        ..Default::default()
    };
    let server = start(config).await;

    let text = query(&server, "SELECT 42 AS answer, 'duck' AS word").await.unwrap();
    assert_eq!(
        text.lines().next(),
        Some("| answer<br>INTEGER | word<br>VARCHAR |")
    );
}

#[tokio::test]
async fn raw_and_tabular_formats() {
    let raw = start(ServerConfig {
        result_format: ResultFormat::Raw,
        ..Default::default()
    })
    .await;
    let text = query(&raw, "SELECT * FROM (VALUES (1, 'a'), (2, 'b')) v(id, name) ORDER BY id")
        .await
        .unwrap();
    assert_eq!(text, r#"[(1, "a"), (2, "b")]"#);

    let tabular = start(ServerConfig {
        result_format: ResultFormat::Tabular,
        ..Default::default()
    })
    .await;
    let text = query(&tabular, "SELECT * FROM range(150)").await.unwrap();
    // border, header, border, 100 rows, border
    assert_eq!(text.lines().count(), 104);
}

#[tokio::test]
async fn nested_values_render_as_duckdb_text() {
    let server = start(ServerConfig::default()).await;

    let text = query(&server, "SELECT [1,2] AS l, INTERVAL 1 DAY AS i, {'a': 1} AS st")
        .await
        .unwrap();
    assert_eq!(text.lines().last(), Some("| [1, 2] | 1 day | {'a': 1} |"));
}

#[tokio::test]
async fn syntax_error_is_reported_as_tool_failure() {
    let server = start(ServerConfig::default()).await;

    let err = query(&server, "SELEC 1").await.unwrap_err();
    assert!(matches!(err, EmbeddableError::ToolFailed(ref m) if m.starts_with("Error executing query")));

    assert_eq!(query(&server, "SELECT 1 AS one").await.unwrap(), "| one |\n| --- |\n| 1 |");
}

// ============================================================================
// Local files
// ============================================================================

#[tokio::test]
async fn read_write_file_is_created() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fresh.duckdb");
    seed(&path).await;
    assert!(path.exists());
}

#[tokio::test]
async fn read_only_file_allows_reads_and_rejects_writes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ducks.duckdb");
    seed(&path).await;

    let server = start(file_config(&path, true)).await;
    let text = query(&server, "SELECT name FROM ducks ORDER BY id").await.unwrap();
    assert_eq!(text, "| name |\n| --- |\n| mallard |\n| teal |");

    let err = query(&server, "INSERT INTO ducks VALUES (3, 'eider')").await.unwrap_err();
    assert!(matches!(err, EmbeddableError::ToolFailed(_)));
}

#[tokio::test]
async fn two_read_only_servers_share_a_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shared.duckdb");
    seed(&path).await;

    let first = start(file_config(&path, true)).await;
    let second = start(file_config(&path, true)).await;

    let a = query(&first, "SELECT count(*) AS n FROM ducks").await.unwrap();
    let b = query(&second, "SELECT count(*) AS n FROM ducks").await.unwrap();
    assert_eq!(a, b);
    assert_eq!(a, "| n |\n| --- |\n| 2 |");
}

#[tokio::test]
async fn read_only_missing_file_fails_to_start() {
    let dir = TempDir::new().unwrap();
    let config = file_config(&dir.path().join("absent.duckdb"), true);
    let result = ServerState::start(&config, Arc::new(DuckDbEngine::default())).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn switch_between_file_and_memory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ducks.duckdb");
    seed(&path).await;

    let server = start(ServerConfig::default()).await;
    server
        .call_tool_text("set_database", json!({ "target": path.to_string_lossy() }))
        .await
        .unwrap();
    let text = query(&server, "SELECT count(*) AS n FROM ducks").await.unwrap();
    assert_eq!(text, "| n |\n| --- |\n| 2 |");

    server
        .call_tool_text("set_database", json!({ "target": ":memory:" }))
        .await
        .unwrap();
    assert!(query(&server, "SELECT * FROM ducks").await.is_err());
}

// ============================================================================
// MotherDuck (requires motherduck_token)
// ============================================================================

#[tokio::test]
#[ignore = "integration test - requires motherduck_token and network"]
async fn motherduck_query() {
    let server = start(ServerConfig {
        db_path: "md:".into(),
        ..Default::default()
    })
    .await;

    let text = query(&server, "SELECT 42 AS answer").await.unwrap();
    assert_eq!(text, "| answer |\n| --- |\n| 42 |");
}

#[tokio::test]
#[ignore = "integration test - requires motherduck_token and network"]
async fn motherduck_listed_when_token_present() {
    let server = start(ServerConfig::default()).await;
    let text = server.call_tool_text("list_databases", json!({})).await.unwrap();
    assert!(text.lines().any(|l| l.trim() == "md:"));
}
