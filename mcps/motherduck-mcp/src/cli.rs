//! Command line arguments

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::ServerConfig;
use crate::types::{ResultFormat, Result};

#[derive(Parser)]
#[command(name = "motherduck-mcp")]
#[command(version)]
#[command(about = "MCP server for DuckDB and MotherDuck databases")]
pub struct Cli {
    /// Database to use: `:memory:`, a local DuckDB file, or `md:` for MotherDuck
    #[arg(long)]
    pub db_path: Option<String>,

    /// MotherDuck access token (default: `motherduck_token` environment variable)
    #[arg(long)]
    pub motherduck_token: Option<String>,

    /// Home directory for DuckDB extensions and secrets
    #[arg(long)]
    pub home_dir: Option<PathBuf>,

    /// Connect to MotherDuck in SaaS mode
    #[arg(long)]
    pub saas_mode: bool,

    /// Open the local database file read-only, with one connection per query
    #[arg(long)]
    pub read_only: bool,

    /// Encoding of query results
    #[arg(long, value_enum)]
    pub result_format: Option<ResultFormat>,

    /// Show column types under the column names
    #[arg(long)]
    pub show_column_types: bool,

    /// Config file (default: MOTHERDUCK_MCP_CONFIG, ~/.binks/motherduck.toml, ./motherduck-mcp.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v debug, -vv trace). Default is info.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Config file (explicit or discovered) with flags applied on top
    pub fn load_config(&self) -> Result<ServerConfig> {
        let base = match &self.config {
            Some(path) => ServerConfig::load_from(path)?,
            None => ServerConfig::load()?,
        };
        Ok(self.apply(base))
    }

    /// Override `config` with every flag that was given
    pub fn apply(&self, mut config: ServerConfig) -> ServerConfig {
        if let Some(db_path) = &self.db_path {
            config.db_path = db_path.clone();
        }
        if let Some(token) = &self.motherduck_token {
            config.motherduck_token = Some(token.clone());
        }
        if let Some(home_dir) = &self.home_dir {
            config.home_dir = Some(home_dir.clone());
        }
        if let Some(format) = self.result_format {
            config.result_format = format;
        }
        config.saas_mode |= self.saas_mode;
        config.read_only |= self.read_only;
        config.show_column_types |= self.show_column_types;
        config
    }
}
