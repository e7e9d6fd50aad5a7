//! Query execution on a leased connection

use crate::manager::ConnectionLease;
use crate::render::render;
use crate::types::{DatabaseError, QueryResult, ResultFormat, Result};

/// Runs SQL on a lease and renders the result
#[derive(Debug, Clone, Copy)]
pub struct QueryExecutor {
    format: ResultFormat,
    show_types: bool,
}

impl QueryExecutor {
    pub fn new(format: ResultFormat, show_types: bool) -> Self {
        Self { format, show_types }
    }

    pub fn format(&self) -> ResultFormat {
        self.format
    }

    /// Execute `sql` and render the result.
    ///
    /// The lease is released on every path, including query failures and a
    /// panicking engine (the lease is dropped with the blocking task).
    pub async fn execute(&self, lease: ConnectionLease, sql: &str) -> Result<String> {
        let result = run_query(lease, sql.to_string()).await?;
        Ok(render(&result, self.format, self.show_types))
    }
}

async fn run_query(mut lease: ConnectionLease, sql: String) -> Result<QueryResult> {
    let lifetime = lease.lifetime();
    let outcome = tokio::task::spawn_blocking(move || {
        let result = lease.execute(&sql);
        if let Err(e) = lease.release() {
            tracing::warn!("Failed to release connection: {}", e);
        }
        result
    })
    .await
    .map_err(|e| DatabaseError::Query(format!("query task failed: {}", e)))?;

    match outcome {
        Ok(result) => {
            tracing::debug!(
                lifetime = ?lifetime,
                columns = result.columns.len(),
                rows = result.rows.len(),
                "Query completed"
            );
            Ok(result)
        }
        Err(err @ DatabaseError::Query(_)) => Err(err),
        Err(other) => Err(DatabaseError::Query(other.to_string())),
    }
}
