//! MCP Common - Shared plumbing for MCP servers
//!
//! - **Initialization**: [`init_tracing`] and the [`serve_stdio`] loop with a
//!   shutdown hook that runs on transport close and on Ctrl-C
//! - **Results**: helpers for building `CallToolResult` values, including
//!   failed results that carry an error message as text
//! - **Embeddable**: [`EmbeddableMcp`] for calling tools in-process
//!
//! # Example
//!
//! ```rust,ignore
//! use mcp_common::{init_tracing, serve_stdio, verbosity_level};
//!
//! init_tracing("my_mcp", verbosity_level(0))?;
//! let state = server.state();
//! serve_stdio(server, || async move { state.shutdown().await }).await?;
//! ```

pub mod embeddable;
pub mod init;
pub mod result;

pub use embeddable::{EmbeddableError, EmbeddableMcp, EmbeddableResult};
pub use init::{init_tracing, serve_stdio, verbosity_level};
pub use result::{result_text, text_success, tool_failure};

pub use rmcp::{
    model::{CallToolResult, Content, Tool},
    ErrorData as McpError,
};

pub use async_trait::async_trait;
