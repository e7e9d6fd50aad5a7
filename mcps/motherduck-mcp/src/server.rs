//! MCP server exposing DuckDB / MotherDuck as tools
//!
//! Every tool turns its arguments into a [`ToolCall`] and runs it through
//! [`dispatch`]. Database errors come back as failed tool results, never as
//! protocol errors, so one bad query does not affect the session.

use std::sync::Arc;

use mcp_common::{
    async_trait, text_success, tool_failure, CallToolResult, EmbeddableMcp, EmbeddableResult,
    McpError, Tool,
};
use rmcp::{
    handler::server::{
        router::{prompt::PromptRouter, tool::ToolRouter},
        wrapper::Parameters,
    },
    model::{
        GetPromptRequestParam, GetPromptResult, ListPromptsResult, PaginatedRequestParam,
        PromptMessage, PromptMessageRole, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
    RoleServer,
    prompt, prompt_handler, prompt_router, tool, tool_handler, tool_router,
};
use serde_json::Value;

use crate::params::{QueryParams, SetDatabaseParams};
use crate::prompt::{initial_prompt, INITIAL_PROMPT_DESCRIPTION};
use crate::state::ServerState;
use crate::tools::{dispatch, ToolCall};
use crate::types::{EngineMode, ResultFormat};

/// The MotherDuck MCP Server
#[derive(Clone)]
pub struct MotherDuckMcpServer {
    state: Arc<ServerState>,
    tool_router: ToolRouter<Self>,
    prompt_router: PromptRouter<Self>,
}

impl MotherDuckMcpServer {
    pub fn new(state: Arc<ServerState>) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
            prompt_router: Self::prompt_router(),
        }
    }

    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    async fn run(&self, call: ToolCall) -> CallToolResult {
        let name = call.name();
        match dispatch(&self.state, call).await {
            Ok(text) => text_success(text),
            Err(e) => {
                tracing::warn!(tool = name, "Tool call failed: {}", e);
                tool_failure(e)
            }
        }
    }

    fn instructions(&self) -> String {
        let database = match self.state.current_mode() {
            EngineMode::Cloud if self.state.credentials().saas_mode() => {
                "a MotherDuck database in SaaS mode (local file access is disabled)"
            }
            EngineMode::Cloud => "a MotherDuck cloud database",
            EngineMode::InMemory => "an in-memory DuckDB database",
            EngineMode::LocalFile if self.state.read_only() => {
                "a local DuckDB file, read-only (each query opens its own connection)"
            }
            EngineMode::LocalFile => "a local DuckDB file",
        };
        let format = match self.state.result_format() {
            ResultFormat::Markdown => "markdown tables",
            ResultFormat::Tabular => "boxed text tables (first 100 rows)",
            ResultFormat::Raw => "raw row tuples",
        };
        format!(
            "DuckDB / MotherDuck MCP server, currently connected to {}. \
             Use query to run DuckDB SQL, list_databases to see reachable databases, \
             set_database to switch databases and get_database to show the current one. \
             Query results are returned as {}.",
            database, format
        )
    }
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router]
impl MotherDuckMcpServer {
    #[tool(description = "Execute a SQL query on the current DuckDB/MotherDuck database, or on `target` for this query only. Uses the DuckDB SQL dialect.")]
    async fn query(
        &self,
        Parameters(params): Parameters<QueryParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.run(ToolCall::Query(params)).await)
    }

    #[tool(description = "List databases this server can reach: MotherDuck (when a token is configured), in-memory, and DuckDB files under the working directory.")]
    async fn list_databases(&self) -> Result<CallToolResult, McpError> {
        Ok(self.run(ToolCall::ListDatabases).await)
    }

    #[tool(description = "Switch the current database. Accepts `:memory:`, a local DuckDB file path, or `md:` / `md:<name>` for MotherDuck.")]
    async fn set_database(
        &self,
        Parameters(params): Parameters<SetDatabaseParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.run(ToolCall::SetDatabase(params)).await)
    }

    #[tool(description = "Show the current database identifier.")]
    async fn get_database(&self) -> Result<CallToolResult, McpError> {
        Ok(self.run(ToolCall::GetDatabase).await)
    }
}

// ============================================================================
// Prompt Router
// ============================================================================

#[prompt_router]
impl MotherDuckMcpServer {
    #[prompt(
        name = "duckdb-motherduck-initial-prompt",
        description = "A prompt to initialize a connection to DuckDB or MotherDuck and start working with it"
    )]
    async fn initial_prompt(&self) -> GetPromptResult {
        let current = self.state.get_database().await;
        GetPromptResult {
            description: Some(INITIAL_PROMPT_DESCRIPTION.to_string()),
            messages: vec![PromptMessage::new_text(
                PromptMessageRole::User,
                initial_prompt(&current, self.state.read_only()),
            )],
        }
    }
}

// ============================================================================
// Server Handler Implementation
// ============================================================================

#[tool_handler]
#[prompt_handler]
impl rmcp::ServerHandler for MotherDuckMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(self.instructions()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .build(),
            ..Default::default()
        }
    }
}

// ============================================================================
// EmbeddableMcp Implementation
// ============================================================================

#[async_trait]
impl EmbeddableMcp for MotherDuckMcpServer {
    fn server_name(&self) -> &str {
        "motherduck"
    }

    fn server_description(&self) -> Option<&str> {
        Some("DuckDB / MotherDuck MCP Server - run SQL and switch between local, in-memory and cloud databases.")
    }

    fn server_version(&self) -> Option<&str> {
        Some(env!("CARGO_PKG_VERSION"))
    }

    fn list_tools(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }

    async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult> {
        let call = ToolCall::parse(name, params)?;
        Ok(self.run(call).await)
    }
}
