//! Turns a database identifier into a [`DatabaseTarget`]
//!
//! Resolution is pure over its inputs: it inspects the filesystem for
//! existence checks but never opens, creates or locks anything.

use std::path::{Path, PathBuf};

use crate::types::{
    Credentials, DatabaseError, DatabaseTarget, EngineMode, Result, TOKEN_PARAM,
};

/// Identifier of the transient in-memory database
pub const IN_MEMORY: &str = ":memory:";

/// Canonical MotherDuck handle, listed by discovery
pub const CLOUD_HANDLE: &str = "md:";

/// Prefixes that mark a MotherDuck identifier
pub const CLOUD_PREFIXES: [&str; 2] = ["md:", "motherduck:"];

/// Whether a local path has to exist before it can be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRequirement {
    /// The engine will not create the file (read-only access)
    MustExist,
    /// The engine creates the database file on first connect
    MayCreate,
}

impl PathRequirement {
    pub fn for_read_only(read_only: bool) -> Self {
        if read_only {
            Self::MustExist
        } else {
            Self::MayCreate
        }
    }
}

pub fn is_cloud_identifier(raw: &str) -> bool {
    CLOUD_PREFIXES.iter().any(|prefix| raw.starts_with(prefix))
}

/// Resolve `raw` into a target.
///
/// Rules, first match wins:
/// 1. `:memory:` is the in-memory database, no credentials needed.
/// 2. A cloud prefix needs a token; the token (and the SaaS marker when
///    enabled) is appended to the connection string.
/// 3. Anything else is a local path, `~` expanded.
pub fn resolve(
    raw: &str,
    credentials: &Credentials,
    requirement: PathRequirement,
) -> Result<DatabaseTarget> {
    if raw == IN_MEMORY {
        return Ok(DatabaseTarget::new(raw, EngineMode::InMemory, IN_MEMORY));
    }

    if is_cloud_identifier(raw) {
        let token = credentials
            .token()
            .ok_or_else(|| DatabaseError::MissingCredentials(raw.to_string()))?;
        let separator = if raw.contains('?') { '&' } else { '?' };
        let mut uri = format!("{}{}{}{}", raw, separator, TOKEN_PARAM, token);
        if credentials.saas_mode() {
            uri.push_str("&saas_mode=true");
        }
        tracing::debug!(
            db = raw,
            saas_mode = credentials.saas_mode(),
            "Resolved MotherDuck target"
        );
        return Ok(DatabaseTarget::new(raw, EngineMode::Cloud, uri));
    }

    let path = expand_home(raw);
    if requirement == PathRequirement::MustExist && !path.exists() {
        return Err(DatabaseError::PathNotFound(path));
    }
    Ok(DatabaseTarget::new(
        raw,
        EngineMode::LocalFile,
        path.to_string_lossy(),
    ))
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        if rest.is_empty() || rest.starts_with('/') {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest.trim_start_matches('/'));
            }
        }
    }
    Path::new(path).to_path_buf()
}
