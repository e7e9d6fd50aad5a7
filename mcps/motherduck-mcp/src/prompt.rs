//! The `duckdb-motherduck-initial-prompt` prompt template

pub const INITIAL_PROMPT: &str = "duckdb-motherduck-initial-prompt";

pub const INITIAL_PROMPT_DESCRIPTION: &str =
    "A prompt to initialize a connection to DuckDB or MotherDuck and start working with it";

const TEMPLATE: &str = "\
You are working with a DuckDB database through the tools of this MCP server.

Tools:
- `query` runs one SQL statement and returns the result as a table. Pass
  `target` to run a single statement against another database.
- `list_databases` shows the databases this server can reach.
- `set_database` switches the current database: `:memory:`, a path to a
  DuckDB file, or `md:` / `md:<name>` for MotherDuck.
- `get_database` shows the current database.

How to start:
1. Check the current database with `get_database`, and look at the other
   reachable databases with `list_databases`.
2. Explore the schema before querying data: `SHOW ALL TABLES`, `DESCRIBE
   <table>` and `SUMMARIZE <table>` are cheap and tell you the column names
   and types.
3. Write DuckDB SQL. DuckDB reads files directly (`SELECT * FROM
   'data.parquet'`, `read_csv('file.csv')`), supports `FROM <table>` without a
   `SELECT` list, `GROUP BY ALL`, `EXCLUDE` / `REPLACE` in select lists, lists,
   structs and maps.
4. Keep result sets small with `LIMIT` while exploring, and aggregate in SQL
   rather than fetching raw rows.
5. When a query fails, read the error message: it names the missing table,
   column or function, and DuckDB often suggests the closest match.

MotherDuck databases are addressed as `md:<name>`; tables in other attached
databases are addressed as `<database>.<schema>.<table>`.";

/// Prompt text for the current database
pub fn initial_prompt(current: &str, read_only: bool) -> String {
    let access = if read_only { ", opened read-only" } else { "" };
    format!("{}\n\nCurrent database: `{}`{}.", TEMPLATE, current, access)
}
