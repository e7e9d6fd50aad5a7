//! Connection manager: the only component that opens and closes engine handles
//!
//! One persistent handle is cached per server. Acquiring it locks the cache
//! slot for as long as the returned lease lives, so a target switch waits
//! for any query still running on the old handle. Ephemeral leases own their
//! handle outright and close it on release or drop.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::engine::{Engine, EngineHandle, PROBE_SQL};
use crate::types::{DatabaseError, DatabaseTarget, LeasePolicy, Lifetime, QueryResult, Result};

struct Cached {
    target: DatabaseTarget,
    handle: Box<dyn EngineHandle>,
}

type Slot = Option<Cached>;

/// Owns engine handles for one server
pub struct ConnectionManager {
    engine: Arc<dyn Engine>,
    persistent: Arc<Mutex<Slot>>,
}

impl ConnectionManager {
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self {
            engine,
            persistent: Arc::new(Mutex::new(None)),
        }
    }

    /// Obtain a lease on `target` according to `policy`.
    ///
    /// Persistent leases reuse the cached handle when it belongs to `target`;
    /// otherwise the cached handle is closed and a new one is opened and
    /// validated with a probe statement.
    pub async fn acquire(&self, target: &DatabaseTarget, policy: LeasePolicy) -> Result<ConnectionLease> {
        match policy.lifetime {
            Lifetime::Ephemeral => {
                let handle = self.connect(target, policy.read_only).await?;
                tracing::debug!(db = %target, "Opened ephemeral connection");
                Ok(ConnectionLease {
                    lifetime: Lifetime::Ephemeral,
                    read_only: policy.read_only,
                    handle: LeaseHandle::Ephemeral(Some(handle)),
                })
            }
            Lifetime::Persistent => {
                let mut slot = Arc::clone(&self.persistent).lock_owned().await;
                let reusable = slot.as_ref().is_some_and(|c| c.target == *target);
                if !reusable {
                    if let Some(stale) = slot.take() {
                        self.close_cached(stale).await;
                    }
                    let handle = self.open_validated(target, policy.read_only).await?;
                    *slot = Some(Cached {
                        target: target.clone(),
                        handle,
                    });
                }
                Ok(ConnectionLease {
                    lifetime: Lifetime::Persistent,
                    read_only: policy.read_only,
                    handle: LeaseHandle::Persistent(slot),
                })
            }
        }
    }

    /// Make `target` the active target.
    ///
    /// Closes the cached persistent handle (waiting for an in-flight query on
    /// it to finish), then either opens and validates a new persistent handle
    /// or, for ephemeral targets, runs a probe on a throwaway connection.
    /// A cached handle that already belongs to `target` is kept as is, so an
    /// in-memory database keeps its contents. On failure nothing new is cached.
    pub async fn activate(&self, target: &DatabaseTarget, policy: LeasePolicy) -> Result<()> {
        let mut slot = Arc::clone(&self.persistent).lock_owned().await;
        let current = slot.as_ref().is_some_and(|c| c.target == *target);
        if current && policy.lifetime == Lifetime::Persistent {
            tracing::debug!(db = %target, "Target already active, keeping connection");
            return Ok(());
        }
        if let Some(previous) = slot.take() {
            tracing::info!(db = %previous.target, "Closing persistent connection");
            self.close_cached(previous).await;
        }

        match policy.lifetime {
            Lifetime::Persistent => {
                let handle = self.open_validated(target, policy.read_only).await?;
                *slot = Some(Cached {
                    target: target.clone(),
                    handle,
                });
                tracing::info!(
                    db = %target,
                    mode = target.engine_mode().as_str(),
                    "Persistent connection ready"
                );
            }
            Lifetime::Ephemeral => {
                let handle = self.open_validated(target, policy.read_only).await?;
                run_blocking(move || handle.close()).await?;
                tracing::info!(db = %target, "Read-only target reachable");
            }
        }
        Ok(())
    }

    /// Target of the cached persistent handle, if any
    pub async fn persistent_target(&self) -> Option<DatabaseTarget> {
        self.persistent.lock().await.as_ref().map(|c| c.target.clone())
    }

    /// Close the cached persistent handle. Waits for an in-flight query.
    pub async fn shutdown(&self) -> Result<()> {
        let cached = self.persistent.lock().await.take();
        match cached {
            Some(cached) => {
                tracing::info!(db = %cached.target, "Closing persistent connection");
                run_blocking(move || cached.handle.close()).await
            }
            None => Ok(()),
        }
    }

    async fn connect(&self, target: &DatabaseTarget, read_only: bool) -> Result<Box<dyn EngineHandle>> {
        let engine = Arc::clone(&self.engine);
        let target = target.clone();
        run_blocking(move || engine.connect(&target, read_only)).await
    }

    async fn open_validated(&self, target: &DatabaseTarget, read_only: bool) -> Result<Box<dyn EngineHandle>> {
        let mut handle = self.connect(target, read_only).await?;
        run_blocking(move || match handle.execute(PROBE_SQL) {
            Ok(_) => Ok(handle),
            Err(err) => {
                if let Err(close_err) = handle.close() {
                    tracing::warn!("Failed to close unreachable connection: {}", close_err);
                }
                Err(match err {
                    DatabaseError::Query(message) => DatabaseError::Connection(message),
                    other => other,
                })
            }
        })
        .await
    }

    async fn close_cached(&self, cached: Cached) {
        let Cached { target, handle } = cached;
        if let Err(e) = run_blocking(move || handle.close()).await {
            tracing::warn!(db = %target, "Failed to close connection: {}", e);
        }
    }
}

/// Run a blocking engine call off the async runtime
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DatabaseError::Connection(format!("engine task failed: {}", e)))?
}

enum LeaseHandle {
    Ephemeral(Option<Box<dyn EngineHandle>>),
    Persistent(OwnedMutexGuard<Slot>),
}

/// One acquired engine handle.
///
/// A persistent lease keeps the cached handle locked until dropped. An
/// ephemeral lease closes its handle on [`ConnectionLease::release`], or on
/// drop if it was never released.
pub struct ConnectionLease {
    lifetime: Lifetime,
    read_only: bool,
    handle: LeaseHandle,
}

impl ConnectionLease {
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Run `sql` on the leased handle. Blocks until the engine returns.
    pub fn execute(&mut self, sql: &str) -> Result<QueryResult> {
        let handle = match &mut self.handle {
            LeaseHandle::Ephemeral(handle) => handle.as_deref_mut(),
            LeaseHandle::Persistent(slot) => slot.as_mut().map(|c| c.handle.as_mut()),
        };
        match handle {
            Some(handle) => handle.execute(sql),
            None => Err(DatabaseError::Connection(
                "lease no longer holds a connection".to_string(),
            )),
        }
    }

    /// Give the lease back. Ephemeral handles are closed here; persistent
    /// handles stay cached and only the lock is released.
    pub fn release(mut self) -> Result<()> {
        match &mut self.handle {
            LeaseHandle::Ephemeral(handle) => match handle.take() {
                Some(handle) => handle.close(),
                None => Ok(()),
            },
            LeaseHandle::Persistent(_) => Ok(()),
        }
    }
}

impl Drop for ConnectionLease {
    fn drop(&mut self) {
        if let LeaseHandle::Ephemeral(handle) = &mut self.handle {
            if let Some(handle) = handle.take() {
                if let Err(e) = handle.close() {
                    tracing::warn!("Failed to close ephemeral connection: {}", e);
                }
            }
        }
    }
}
