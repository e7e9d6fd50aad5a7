//! Tool-call tests for motherduck-mcp
//!
//! Drives the server in-process through `EmbeddableMcp::call_tool` against
//! the scripted `MockEngine`, so no DuckDB is needed.
//!
//! ```bash
//! cargo test -p motherduck-mcp --test tool_calls
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use mcp_common::{result_text, EmbeddableError, EmbeddableMcp};
use motherduck_mcp::engine::{QueryGate, PROBE_SQL};
use motherduck_mcp::types::{ColumnInfo, Credentials, Value};
use motherduck_mcp::{
    DiscoveryConfig, MockEngine, MotherDuckMcpServer, QueryResult, ResultFormat, ServerConfig,
    ServerState,
};
use serde_json::json;
use tempfile::TempDir;

async fn start(engine: &MockEngine, config: ServerConfig) -> MotherDuckMcpServer {
    let state = ServerState::start(&config, Arc::new(engine.clone()))
        .await
        .expect("server should start");
    MotherDuckMcpServer::new(Arc::new(state))
}

fn read_only_config(path: &Path) -> ServerConfig {
    ServerConfig {
        db_path: path.to_string_lossy().to_string(),
        read_only: true,
        ..Default::default()
    }
}

fn id_name() -> QueryResult {
    QueryResult::new(
        vec![ColumnInfo::new("id", "INTEGER"), ColumnInfo::new("name", "VARCHAR")],
        vec![
            vec![Value::Int(1), Value::from("a")],
            vec![Value::Int(2), Value::from("b")],
        ],
    )
}

// ============================================================================
// query
// ============================================================================

#[tokio::test]
async fn query_renders_markdown_by_default() {
    let engine = MockEngine::new().with_result("SELECT id, name FROM t", id_name());
    let server = start(&engine, ServerConfig::default()).await;

    let text = server
        .call_tool_text("query", json!({ "sql": "SELECT id, name FROM t" }))
        .await
        .unwrap();

    assert_eq!(text, "| id | name |\n| --- | --- |\n| 1 | a |\n| 2 | b |");
}

#[tokio::test]
async fn query_renders_configured_format() {
    let engine = MockEngine::new().with_result("SELECT id, name FROM t", id_name());
    let config = ServerConfig {
        result_format: ResultFormat::Raw,
        ..Default::default()
    };
    let server = start(&engine, config).await;

    let text = server
        .call_tool_text("query", json!({ "sql": "SELECT id, name FROM t" }))
        .await
        .unwrap();

    assert_eq!(text, r#"[(1, "a"), (2, "b")]"#);
}

#[tokio::test]
async fn query_failure_is_tool_error_and_server_keeps_serving() {
    let engine = MockEngine::new().with_failure(
        "SELEC 1",
        "Parser Error: syntax error at or near \"SELEC\"",
    );
    let server = start(&engine, ServerConfig::default()).await;

    let result = server
        .call_tool("query", json!({ "sql": "SELEC 1" }))
        .await
        .unwrap();
    assert_eq!(result.is_error, Some(true));
    assert!(result_text(&result).starts_with("Error executing query: Parser Error"));

    let text = server
        .call_tool_text("query", json!({ "sql": "SELECT 'still here'" }))
        .await
        .unwrap();
    assert!(text.contains("still here"));
}

#[tokio::test]
async fn read_only_queries_use_independent_connections() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("shared.duckdb");
    std::fs::write(&file, b"").unwrap();

    let engine = MockEngine::new().with_result("SELECT id, name FROM t", id_name());
    let server = start(&engine, read_only_config(&file)).await;

    // startup probe: one connection, opened and closed
    assert_eq!(engine.opened(), 1);
    assert_eq!(engine.closed(), 1);

    let args = json!({ "sql": "SELECT id, name FROM t" });
    let first = server.call_tool_text("query", args.clone()).await.unwrap();
    let second = server.call_tool_text("query", args).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(engine.opened(), 3);
    assert_eq!(engine.closed(), 3);
    assert!(engine.connections().iter().all(|(_, read_only)| *read_only));
}

#[tokio::test]
async fn query_target_override_leaves_current_database() {
    let engine = MockEngine::new();
    let server = start(&engine, ServerConfig::default()).await;

    server
        .call_tool_text("query", json!({ "sql": "SELECT 1", "target": "scratch.duckdb" }))
        .await
        .unwrap();

    let current = server.call_tool_text("get_database", json!({})).await.unwrap();
    assert_eq!(current, ":memory:");
    assert_eq!(engine.open_handles(), 1);
}

// ============================================================================
// set_database / get_database
// ============================================================================

#[tokio::test]
async fn set_then_get_returns_same_identifier() {
    let engine = MockEngine::new();
    let config = ServerConfig {
        motherduck_token: Some("test-token".into()),
        ..Default::default()
    };
    let server = start(&engine, config).await;

    for target in ["analytics.duckdb", "md:my_db", ":memory:", "md:"] {
        let message = server
            .call_tool_text("set_database", json!({ "target": target }))
            .await
            .unwrap();
        assert!(message.contains(target));

        let current = server.call_tool_text("get_database", json!({})).await.unwrap();
        assert_eq!(current, target);
    }

    // one persistent handle at a time, the rest closed on switch
    assert_eq!(engine.open_handles(), 1);
    assert_eq!(engine.opened(), 5);
}

#[tokio::test]
async fn set_database_in_read_only_mode_rejects_memory() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("shared.duckdb");
    std::fs::write(&file, b"").unwrap();

    let engine = MockEngine::new();
    let server = start(&engine, read_only_config(&file)).await;

    let err = server
        .call_tool_text("set_database", json!({ "target": ":memory:" }))
        .await
        .unwrap_err();
    assert!(matches!(err, EmbeddableError::ToolFailed(ref m) if m.contains("Read-only mode")));

    let current = server.call_tool_text("get_database", json!({})).await.unwrap();
    assert_eq!(current, file.to_string_lossy());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn set_database_waits_for_in_flight_query() {
    let gate = QueryGate::new();
    let engine = MockEngine::new().with_gate("slow_table", Arc::clone(&gate));
    let server = start(&engine, ServerConfig::default()).await;

    let query = {
        let server = server.clone();
        tokio::spawn(async move {
            server
                .call_tool_text("query", json!({ "sql": "SELECT * FROM slow_table" }))
                .await
        })
    };
    while !gate.has_entered() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let switch = {
        let server = server.clone();
        tokio::spawn(async move {
            server
                .call_tool_text("set_database", json!({ "target": "next.duckdb" }))
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    // the old handle is still serving the query
    assert!(!switch.is_finished());
    assert_eq!(engine.closed(), 0);

    gate.release();
    let text = query.await.unwrap().unwrap();
    assert!(text.contains("slow_table"));
    switch.await.unwrap().unwrap();

    assert_eq!(engine.closed(), 1);
    assert_eq!(engine.open_handles(), 1);
    let current = server.call_tool_text("get_database", json!({})).await.unwrap();
    assert_eq!(current, "next.duckdb");
}

// ============================================================================
// list_databases
// ============================================================================

#[tokio::test]
async fn list_databases_caps_local_files() {
    let dir = TempDir::new().unwrap();
    for i in 0..25 {
        std::fs::write(dir.path().join(format!("db{:02}.duckdb", i)), b"").unwrap();
    }
    let engine = MockEngine::new();
    let config = ServerConfig {
        discovery: DiscoveryConfig {
            root: Some(dir.path().to_path_buf()),
            ..Default::default()
        },
        ..Default::default()
    };
    let server = start(&engine, config).await;

    let text = server.call_tool_text("list_databases", json!({})).await.unwrap();
    let files: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| l.ends_with(".duckdb"))
        .collect();

    assert_eq!(files.len(), 20);
    assert!(text.contains(":memory:"));
    assert_eq!(text.lines().last().map(str::trim), Some("... +5 more"));
    if !Credentials::from_env(None, false).has_token() {
        assert!(!text.contains("md:"));
    }
}

// ============================================================================
// Dispatch errors
// ============================================================================

#[tokio::test]
async fn unknown_tool_and_bad_arguments() {
    let engine = MockEngine::new();
    let server = start(&engine, ServerConfig::default()).await;

    assert!(matches!(
        server.call_tool("drop_database", json!({})).await,
        Err(EmbeddableError::ToolNotFound(_))
    ));
    assert!(matches!(
        server.call_tool("query", json!({ "statement": "SELECT 1" })).await,
        Err(EmbeddableError::InvalidParams(_))
    ));
    assert!(matches!(
        server.call_tool("set_database", serde_json::Value::Null).await,
        Err(EmbeddableError::InvalidParams(_))
    ));

    // nothing beyond the startup probe reached the engine
    assert_eq!(engine.executed(), vec![PROBE_SQL]);
}
