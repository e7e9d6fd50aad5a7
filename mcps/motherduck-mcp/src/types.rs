//! Type definitions for the MotherDuck MCP server

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Targets and Credentials
// ============================================================================

/// Which kind of database a target identifier refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    /// A DuckDB file on the local filesystem
    LocalFile,
    /// A transient DuckDB instance (`:memory:`)
    InMemory,
    /// A MotherDuck cloud database (`md:` handle)
    Cloud,
}

impl EngineMode {
    /// Short name used in logs and server instructions
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocalFile => "duckdb",
            Self::InMemory => "in-memory",
            Self::Cloud => "motherduck",
        }
    }
}

impl fmt::Display for EngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::LocalFile => "local file",
            Self::InMemory => "in-memory",
            Self::Cloud => "MotherDuck",
        };
        f.write_str(label)
    }
}

/// A resolved database identifier. Only the resolver constructs these.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseTarget {
    raw_identifier: String,
    engine_mode: EngineMode,
    resolved_uri: String,
}

impl DatabaseTarget {
    pub(crate) fn new(
        raw_identifier: impl Into<String>,
        engine_mode: EngineMode,
        resolved_uri: impl Into<String>,
    ) -> Self {
        Self {
            raw_identifier: raw_identifier.into(),
            engine_mode,
            resolved_uri: resolved_uri.into(),
        }
    }

    /// The identifier exactly as the caller supplied it
    pub fn raw_identifier(&self) -> &str {
        &self.raw_identifier
    }

    pub fn engine_mode(&self) -> EngineMode {
        self.engine_mode
    }

    /// Connection string handed to the engine. May embed a token.
    pub fn resolved_uri(&self) -> &str {
        &self.resolved_uri
    }

    /// `resolved_uri` with any embedded token masked, safe for logs
    pub fn redacted_uri(&self) -> String {
        redact_token(&self.resolved_uri)
    }
}

impl fmt::Debug for DatabaseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseTarget")
            .field("raw_identifier", &self.raw_identifier)
            .field("engine_mode", &self.engine_mode)
            .field("resolved_uri", &self.redacted_uri())
            .finish()
    }
}

impl fmt::Display for DatabaseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw_identifier)
    }
}

pub(crate) const TOKEN_PARAM: &str = "motherduck_token=";

fn redact_token(uri: &str) -> String {
    let Some(start) = uri.find(TOKEN_PARAM) else {
        return uri.to_string();
    };
    let value_start = start + TOKEN_PARAM.len();
    let value_end = uri[value_start..]
        .find('&')
        .map(|i| value_start + i)
        .unwrap_or(uri.len());
    format!("{}***{}", &uri[..value_start], &uri[value_end..])
}

/// Cloud credentials, fixed for the lifetime of the process
#[derive(Clone, Default)]
pub struct Credentials {
    token: Option<String>,
    saas_mode: bool,
}

impl Credentials {
    /// Environment variables consulted when no token is passed explicitly
    pub const TOKEN_ENV_VARS: [&'static str; 2] = ["motherduck_token", "MOTHERDUCK_TOKEN"];

    pub fn new(token: Option<String>, saas_mode: bool) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
            saas_mode,
        }
    }

    /// Explicit token first, then the process environment.
    pub fn from_env(explicit: Option<String>, saas_mode: bool) -> Self {
        Self::from_lookup(explicit, saas_mode, |key| std::env::var(key).ok())
    }

    /// Like [`Credentials::from_env`] with an injectable variable lookup.
    pub fn from_lookup(
        explicit: Option<String>,
        saas_mode: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let token = explicit.filter(|t| !t.trim().is_empty()).or_else(|| {
            Self::TOKEN_ENV_VARS
                .iter()
                .find_map(|key| lookup(key).filter(|t| !t.trim().is_empty()))
        });
        Self::new(token, saas_mode)
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn saas_mode(&self) -> bool {
        self.saas_mode
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("saas_mode", &self.saas_mode)
            .finish()
    }
}

// ============================================================================
// Connection Policy Types
// ============================================================================

/// How long an engine handle lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Opened once, reused for every query until replaced or shut down
    Persistent,
    /// Opened for a single query, closed right after
    Ephemeral,
}

/// Outcome of the connection policy for one target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeasePolicy {
    pub lifetime: Lifetime,
    pub read_only: bool,
}

impl LeasePolicy {
    pub const PERSISTENT: Self = Self {
        lifetime: Lifetime::Persistent,
        read_only: false,
    };

    pub const EPHEMERAL_READ_ONLY: Self = Self {
        lifetime: Lifetime::Ephemeral,
        read_only: true,
    };
}

// ============================================================================
// Query Results
// ============================================================================

/// Output encoding for query results
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ResultFormat {
    /// Pipe-delimited markdown table
    #[default]
    Markdown,
    /// Boxed fixed-width table, capped at 100 rows
    Tabular,
    /// Literal row tuples without a header
    Raw,
}

/// Name and declared type of a result column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A single value from a result row
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    /// Engine-formatted value without a closer mapping (dates, decimals, lists, ...)
    Other(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Text(s) | Value::Other(s) => f.write_str(s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

pub type Row = Vec<Value>;

/// Columns and rows of one executed statement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Row>,
}

impl QueryResult {
    pub fn new(columns: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error(
        "No MotherDuck token for `{0}`: pass --motherduck-token or set the `motherduck_token` environment variable"
    )]
    MissingCredentials(String),

    #[error("Read-only mode is only supported for local database files, not {0} targets")]
    UnsupportedReadOnlyMode(EngineMode),

    #[error("Database file not found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Error executing query: {0}")]
    Query(String),

    #[error("Database discovery failed: {0}")]
    Discovery(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl DatabaseError {
    /// Failures raised while turning an identifier into a usable target
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            Self::MissingCredentials(_) | Self::UnsupportedReadOnlyMode(_) | Self::PathNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
