//! MotherDuck MCP Library
//!
//! DuckDB and MotherDuck databases as MCP tools: run SQL, list reachable
//! databases, and switch between in-memory, local file and cloud targets.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use motherduck_mcp::{DuckDbEngine, MotherDuckMcpServer, ServerConfig, ServerState};
//! use mcp_common::EmbeddableMcp;
//!
//! let state = ServerState::start(&ServerConfig::default(), Arc::new(DuckDbEngine::default())).await?;
//! let server = MotherDuckMcpServer::new(Arc::new(state));
//! let text = server.call_tool_text("query", serde_json::json!({ "sql": "SELECT 42" })).await?;
//! ```

pub mod cli;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod executor;
pub mod manager;
pub mod params;
pub mod policy;
pub mod prompt;
pub mod render;
pub mod resolver;
pub mod server;
pub mod state;
pub mod tools;
pub mod types;

// Re-export main server type
pub use server::MotherDuckMcpServer;

pub use config::{DiscoveryConfig, ServerConfig};
pub use engine::{DuckDbEngine, Engine, EngineHandle};
#[cfg(any(test, feature = "test-util"))]
pub use engine::MockEngine;
pub use state::ServerState;
pub use types::{DatabaseError, DatabaseTarget, EngineMode, QueryResult, ResultFormat};

// Re-export parameter types for direct API usage
pub use params::*;
