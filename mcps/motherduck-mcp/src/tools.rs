//! Tool calls as a closed set of operations
//!
//! Every transport (rmcp router, in-process embedding) turns a request into a
//! [`ToolCall`] and hands it to [`dispatch`]. Adding a tool means adding a
//! variant, and the compiler points at every match that has to handle it.

use mcp_common::EmbeddableError;
use serde_json::Value;

use crate::params::{QueryParams, SetDatabaseParams};
use crate::state::ServerState;
use crate::types::Result;

pub const QUERY: &str = "query";
pub const LIST_DATABASES: &str = "list_databases";
pub const SET_DATABASE: &str = "set_database";
pub const GET_DATABASE: &str = "get_database";

/// Names of every tool, in listing order
pub const TOOL_NAMES: [&str; 4] = [QUERY, LIST_DATABASES, SET_DATABASE, GET_DATABASE];

#[derive(Debug, Clone)]
pub enum ToolCall {
    Query(QueryParams),
    ListDatabases,
    SetDatabase(SetDatabaseParams),
    GetDatabase,
}

impl ToolCall {
    /// Build a call from a tool name and its JSON arguments.
    ///
    /// Missing (`null`) arguments are treated as an empty object.
    pub fn parse(name: &str, args: Value) -> std::result::Result<Self, EmbeddableError> {
        let args = if args.is_null() {
            Value::Object(Default::default())
        } else {
            args
        };
        match name {
            QUERY => Ok(Self::Query(serde_json::from_value(args)?)),
            LIST_DATABASES => Ok(Self::ListDatabases),
            SET_DATABASE => Ok(Self::SetDatabase(serde_json::from_value(args)?)),
            GET_DATABASE => Ok(Self::GetDatabase),
            other => Err(EmbeddableError::ToolNotFound(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Query(_) => QUERY,
            Self::ListDatabases => LIST_DATABASES,
            Self::SetDatabase(_) => SET_DATABASE,
            Self::GetDatabase => GET_DATABASE,
        }
    }
}

/// Run one tool call against the server state
pub async fn dispatch(state: &ServerState, call: ToolCall) -> Result<String> {
    match call {
        ToolCall::Query(params) => state.query(&params.sql, params.target.as_deref()).await,
        ToolCall::ListDatabases => state.list_databases().await,
        ToolCall::SetDatabase(params) => state.set_database(&params.target).await,
        ToolCall::GetDatabase => Ok(state.get_database().await),
    }
}
