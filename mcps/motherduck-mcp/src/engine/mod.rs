//! SQL engine seam
//!
//! The server treats the engine as an opaque capability: open a handle to a
//! resolved target, run SQL on it, close it. [`DuckDbEngine`] is the real
//! implementation. With the `test-util` feature, `MockEngine` is a scripted
//! stand-in for tests.

mod duckdb_engine;
#[cfg(any(test, feature = "test-util"))]
mod mock;

pub use duckdb_engine::DuckDbEngine;
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockEngine, QueryGate};

use crate::types::{DatabaseTarget, QueryResult, Result};

/// Statement used to validate that a freshly opened handle is usable
pub const PROBE_SQL: &str = "SELECT 1";

/// Opens engine handles. Shared by every request of a server.
pub trait Engine: Send + Sync {
    /// Open a handle to `target`. Blocks until the engine accepts or refuses.
    fn connect(&self, target: &DatabaseTarget, read_only: bool) -> Result<Box<dyn EngineHandle>>;
}

/// One open engine connection
pub trait EngineHandle: Send {
    /// Run `sql` and collect every row. Blocks for the duration of the query.
    fn execute(&mut self, sql: &str) -> Result<QueryResult>;

    /// Close the handle, surfacing any error the engine reports.
    fn close(self: Box<Self>) -> Result<()>;
}
