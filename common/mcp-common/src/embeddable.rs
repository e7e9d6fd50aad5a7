//! In-process tool execution
//!
//! [`EmbeddableMcp`] exposes a server's tools as a plain
//! `(tool name, JSON arguments) -> result` call, with no transport.
//! Hosts embedding a server and the integration tests both go through it.
//!
//! ```rust,ignore
//! use mcp_common::EmbeddableMcp;
//!
//! let text = server
//!     .call_tool_text("query", serde_json::json!({ "sql": "SELECT 42" }))
//!     .await?;
//! ```

use async_trait::async_trait;
use rmcp::model::{CallToolResult, Tool};
use serde_json::Value;

use crate::result::result_text;

/// Error type for embeddable MCP operations
#[derive(Debug, thiserror::Error)]
pub enum EmbeddableError {
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// The tool ran and reported failure; carries the result text.
    #[error("tool failed: {0}")]
    ToolFailed(String),

    #[error("mcp error: {0}")]
    McpError(String),
}

impl From<serde_json::Error> for EmbeddableError {
    fn from(err: serde_json::Error) -> Self {
        EmbeddableError::InvalidParams(err.to_string())
    }
}

impl From<rmcp::ErrorData> for EmbeddableError {
    fn from(err: rmcp::ErrorData) -> Self {
        EmbeddableError::McpError(err.message.to_string())
    }
}

pub type EmbeddableResult<T> = Result<T, EmbeddableError>;

/// MCP server callable in-process
#[async_trait]
pub trait EmbeddableMcp: Send + Sync {
    /// Server name as used in MCP client configuration
    fn server_name(&self) -> &str;

    /// All tools with their input schemas
    fn list_tools(&self) -> Vec<Tool>;

    /// Execute a tool by name.
    ///
    /// Operation failures come back as `Ok` results with `is_error` set;
    /// `Err` is reserved for unknown tools and malformed arguments.
    async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult>;

    fn server_description(&self) -> Option<&str> {
        None
    }

    fn server_version(&self) -> Option<&str> {
        None
    }

    /// Call a tool and return its text, mapping failed results to
    /// [`EmbeddableError::ToolFailed`].
    async fn call_tool_text(&self, name: &str, params: Value) -> EmbeddableResult<String> {
        let result = self.call_tool(name, params).await?;
        let text = result_text(&result);
        if result.is_error.unwrap_or(false) {
            Err(EmbeddableError::ToolFailed(text))
        } else {
            Ok(text)
        }
    }
}
