//! Configuration for the MotherDuck MCP server

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::discovery::DEFAULT_MAX_DEPTH;
use crate::resolver::{is_cloud_identifier, IN_MEMORY};
use crate::types::{Credentials, DatabaseError, EngineMode, ResultFormat, Result};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "MOTHERDUCK_MCP_CONFIG";

/// Server configuration, fixed at startup
#[derive(Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Default database: `:memory:`, a local path or an `md:` handle
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// MotherDuck token. Falls back to the `motherduck_token` environment variable.
    #[serde(default)]
    pub motherduck_token: Option<String>,

    /// Home directory handed to the engine (extension and secret storage)
    #[serde(default)]
    pub home_dir: Option<PathBuf>,

    /// Connect to MotherDuck in SaaS mode
    #[serde(default)]
    pub saas_mode: bool,

    /// Open local files read-only, one short-lived connection per query
    #[serde(default)]
    pub read_only: bool,

    #[serde(default)]
    pub result_format: ResultFormat,

    /// Put the column type under each column name
    #[serde(default)]
    pub show_column_types: bool,

    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

/// Local database file scan settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Scan root. Defaults to the working directory.
    #[serde(default)]
    pub root: Option<PathBuf>,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_db_path() -> String {
    IN_MEMORY.to_string()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            root: None,
            max_depth: default_max_depth(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            motherduck_token: None,
            home_dir: None,
            saas_mode: false,
            read_only: false,
            result_format: ResultFormat::default(),
            show_column_types: false,
            discovery: DiscoveryConfig::default(),
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("db_path", &self.db_path)
            .field("motherduck_token", &self.motherduck_token.as_ref().map(|_| "***"))
            .field("home_dir", &self.home_dir)
            .field("saas_mode", &self.saas_mode)
            .field("read_only", &self.read_only)
            .field("result_format", &self.result_format)
            .field("show_column_types", &self.show_column_types)
            .field("discovery", &self.discovery)
            .finish()
    }
}

impl ServerConfig {
    /// Load config from standard file locations
    ///
    /// Config is searched in order:
    /// 1. `MOTHERDUCK_MCP_CONFIG` env var
    /// 2. `~/.binks/motherduck.toml`
    /// 3. `./motherduck-mcp.toml`
    /// 4. Default config if none found
    ///
    /// A file named by the env var must exist and parse; discovered files
    /// that fail to parse are skipped with a warning.
    pub fn load() -> Result<Self> {
        Self::load_with(std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
    }

    fn load_with(named: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = named {
            let config = Self::load_from(&path)?;
            tracing::info!("Loaded config from {}={}", CONFIG_ENV_VAR, path.display());
            return Ok(config);
        }

        let mut config_paths = Vec::new();
        if let Some(home) = dirs::home_dir() {
            config_paths.push(home.join(".binks").join("motherduck.toml"));
        }
        config_paths.push(PathBuf::from("motherduck-mcp.toml"));

        for path in config_paths {
            if path.exists() {
                match Self::load_from(&path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {}", path.display());
                        return Ok(config);
                    }
                    Err(e) => tracing::warn!("{}", e),
                }
            }
        }

        tracing::info!("Using default configuration");
        Ok(Self::default())
    }

    /// Parse a TOML config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DatabaseError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            DatabaseError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Reject read-only for anything but a local file before the server starts
    pub fn validate(&self) -> Result<()> {
        if self.read_only {
            let mode = if self.db_path == IN_MEMORY {
                Some(EngineMode::InMemory)
            } else if is_cloud_identifier(&self.db_path) {
                Some(EngineMode::Cloud)
            } else {
                None
            };
            if let Some(mode) = mode {
                return Err(DatabaseError::UnsupportedReadOnlyMode(mode));
            }
        }
        if self.discovery.max_depth == 0 {
            return Err(DatabaseError::Config(
                "discovery.max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Explicit token first, then the environment
    pub fn credentials(&self) -> Credentials {
        Credentials::from_env(self.motherduck_token.clone(), self.saas_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.db_path, ":memory:");
        assert_eq!(config.result_format, ResultFormat::Markdown);
        assert!(!config.read_only);
        assert!(!config.show_column_types);
        assert_eq!(config.discovery.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            db_path = "analytics.duckdb"
            read_only = true
            result_format = "tabular"

            [discovery]
            root = "/data"
            "#,
        )
        .unwrap();

        assert_eq!(config.db_path, "analytics.duckdb");
        assert!(config.read_only);
        assert_eq!(config.result_format, ResultFormat::Tabular);
        assert_eq!(config.discovery.root, Some(PathBuf::from("/data")));
        assert_eq!(config.discovery.max_depth, DEFAULT_MAX_DEPTH);
        assert!(!config.saas_mode);
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("motherduck.toml");
        std::fs::write(&path, "db_path = \"md:\"\nsaas_mode = true\n").unwrap();

        let config = ServerConfig::load_from(&path).unwrap();
        assert_eq!(config.db_path, "md:");
        assert!(config.saas_mode);
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "result_format = \"html\"").unwrap();

        let err = ServerConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, DatabaseError::Config(_)));
    }

    #[test]
    fn test_named_config_must_load() {
        let dir = TempDir::new().unwrap();
        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "read_only = \"sometimes\"").unwrap();

        let err = ServerConfig::load_with(Some(broken)).unwrap_err();
        assert!(matches!(err, DatabaseError::Config(ref m) if m.contains("failed to parse")));

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            ServerConfig::load_with(Some(missing)),
            Err(DatabaseError::Config(_))
        ));

        let good = dir.path().join("good.toml");
        std::fs::write(&good, "db_path = \"md:\"").unwrap();
        assert_eq!(ServerConfig::load_with(Some(good)).unwrap().db_path, "md:");
    }

    #[test]
    fn test_validate_read_only_modes() {
        let mut config = ServerConfig {
            read_only: true,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DatabaseError::UnsupportedReadOnlyMode(EngineMode::InMemory))
        ));

        config.db_path = "md:my_db".to_string();
        assert!(matches!(
            config.validate(),
            Err(DatabaseError::UnsupportedReadOnlyMode(EngineMode::Cloud))
        ));

        config.db_path = "local.duckdb".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_hides_token() {
        let config = ServerConfig {
            motherduck_token: Some("very-secret".into()),
            ..Default::default()
        };
        assert!(!format!("{:?}", config).contains("very-secret"));
    }
}
