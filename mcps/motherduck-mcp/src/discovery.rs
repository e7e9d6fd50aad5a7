//! Listing of databases reachable from this server

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::resolver::{CLOUD_HANDLE, IN_MEMORY};
use crate::types::{Credentials, DatabaseError, Result};

/// File extensions recognised as DuckDB databases
pub const DATABASE_EXTENSIONS: [&str; 3] = ["duckdb", "db", "ddb"];

/// Local files listed before the remainder is summarised
pub const MAX_LISTED_FILES: usize = 20;

/// Default recursion bound of the local scan
pub const DEFAULT_MAX_DEPTH: usize = 8;

const SKIPPED_DIRS: [&str; 2] = ["target", "node_modules"];

pub const CLOUD_HEADER: &str = "MotherDuck (cloud):";
pub const MEMORY_HEADER: &str = "In-memory:";
pub const LOCAL_HEADER: &str = "Local database files:";

/// Enumerates the cloud handle, the in-memory database and local files
#[derive(Debug, Clone)]
pub struct DatabaseDiscovery {
    root: Option<PathBuf>,
    max_depth: usize,
}

impl Default for DatabaseDiscovery {
    fn default() -> Self {
        Self::new(None, DEFAULT_MAX_DEPTH)
    }
}

impl DatabaseDiscovery {
    /// `root` defaults to the process working directory at scan time
    pub fn new(root: Option<PathBuf>, max_depth: usize) -> Self {
        Self { root, max_depth }
    }

    /// Human-oriented labels, one per line.
    ///
    /// Only an unreadable scan root is an error; unreadable sub-directories
    /// are skipped.
    pub async fn list(&self, credentials: &Credentials) -> Result<Vec<String>> {
        let mut lines = Vec::new();

        if credentials.has_token() {
            lines.push(CLOUD_HEADER.to_string());
            lines.push(format!("  {}", CLOUD_HANDLE));
        }

        lines.push(MEMORY_HEADER.to_string());
        lines.push(format!("  {}", IN_MEMORY));

        let root = match &self.root {
            Some(root) => root.clone(),
            None => std::env::current_dir()
                .map_err(|e| DatabaseError::Discovery(format!("cannot read working directory: {}", e)))?,
        };
        let files = scan(&root, self.max_depth).await?;
        tracing::debug!(root = %root.display(), found = files.len(), "Scanned for database files");

        if !files.is_empty() {
            lines.push(LOCAL_HEADER.to_string());
            lines.extend(
                files
                    .iter()
                    .take(MAX_LISTED_FILES)
                    .map(|f| format!("  {}", f.display())),
            );
            if files.len() > MAX_LISTED_FILES {
                lines.push(format!("  ... +{} more", files.len() - MAX_LISTED_FILES));
            }
        }

        Ok(lines)
    }
}

/// Database files under `root`, relative to it, shallowest first
async fn scan(root: &Path, max_depth: usize) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut stack = vec![(root.to_path_buf(), 0usize)];

    while let Some((dir, depth)) = stack.pop() {
        let mut read_dir = match fs::read_dir(&dir).await {
            Ok(read_dir) => read_dir,
            Err(e) if depth == 0 => {
                return Err(DatabaseError::Discovery(format!(
                    "cannot scan {}: {}",
                    dir.display(),
                    e
                )))
            }
            Err(e) => {
                tracing::debug!(dir = %dir.display(), "Skipping unreadable directory: {}", e);
                continue;
            }
        };

        loop {
            let entry = match read_dir.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!(dir = %dir.display(), "Stopped reading directory: {}", e);
                    break;
                }
            };
            let Ok(file_type) = entry.file_type().await else {
                continue;
            };
            let path = entry.path();

            if file_type.is_dir() {
                if depth + 1 < max_depth && !is_skipped_dir(&path) {
                    stack.push((path, depth + 1));
                }
            } else if file_type.is_file() && has_database_extension(&path) {
                if let Ok(relative) = path.strip_prefix(root) {
                    found.push(relative.to_path_buf());
                }
            }
        }
    }

    found.sort_by(|a, b| {
        a.components()
            .count()
            .cmp(&b.components().count())
            .then_with(|| a.cmp(b))
    });
    Ok(found)
}

fn is_skipped_dir(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| name.starts_with('.') || SKIPPED_DIRS.contains(&name))
        .unwrap_or(true)
}

fn has_database_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            DATABASE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}
