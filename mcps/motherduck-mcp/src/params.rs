//! Parameter types for MotherDuck MCP tools

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueryParams {
    #[schemars(description = "SQL query to execute (DuckDB SQL dialect)")]
    #[serde(alias = "query")]
    pub sql: String,

    #[schemars(
        description = "Database to run this query against instead of the current one \
                       (optional, e.g. `md:my_db` or a local .duckdb path)"
    )]
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SetDatabaseParams {
    #[schemars(
        description = "Database to switch to: `:memory:`, a local DuckDB file path, or `md:` / `md:<name>` for MotherDuck"
    )]
    pub target: String,
}
