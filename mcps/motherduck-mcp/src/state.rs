//! Process-wide server state
//!
//! One [`ServerState`] per running server. The current target lives behind a
//! single lock that also covers lease acquisition, so `set_database` can never
//! slip between a query reading the target and acquiring its connection.
//! Query execution itself runs after the lock is released.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::ServerConfig;
use crate::discovery::DatabaseDiscovery;
use crate::engine::Engine;
use crate::executor::QueryExecutor;
use crate::manager::{ConnectionLease, ConnectionManager};
use crate::policy::decide;
use crate::resolver::{resolve, PathRequirement};
use crate::types::{
    Credentials, DatabaseTarget, EngineMode, LeasePolicy, Lifetime, Result, ResultFormat,
};

struct Current {
    target: DatabaseTarget,
    policy: LeasePolicy,
}

/// Engine mode of the current target, readable without the target lock
struct ModeCell(AtomicU8);

impl ModeCell {
    fn new(mode: EngineMode) -> Self {
        Self(AtomicU8::new(Self::encode(mode)))
    }

    fn encode(mode: EngineMode) -> u8 {
        match mode {
            EngineMode::LocalFile => 0,
            EngineMode::InMemory => 1,
            EngineMode::Cloud => 2,
        }
    }

    fn load(&self) -> EngineMode {
        match self.0.load(Ordering::Acquire) {
            0 => EngineMode::LocalFile,
            1 => EngineMode::InMemory,
            _ => EngineMode::Cloud,
        }
    }

    fn store(&self, mode: EngineMode) {
        self.0.store(Self::encode(mode), Ordering::Release);
    }
}

pub struct ServerState {
    current: Mutex<Current>,
    mode: ModeCell,
    manager: ConnectionManager,
    executor: QueryExecutor,
    discovery: DatabaseDiscovery,
    credentials: Credentials,
    read_only: bool,
}

impl ServerState {
    /// Resolve the default target and open (or probe) its connection.
    ///
    /// Any failure here is fatal: the server does not start without a
    /// reachable default database.
    pub async fn start(config: &ServerConfig, engine: Arc<dyn Engine>) -> Result<Self> {
        config.validate()?;
        let credentials = config.credentials();
        let requirement = PathRequirement::for_read_only(config.read_only);
        let target = resolve(&config.db_path, &credentials, requirement)?;
        let policy = decide(&target, config.read_only)?;

        let manager = ConnectionManager::new(engine);
        manager.activate(&target, policy).await?;

        tracing::info!(
            db = %target,
            mode = target.engine_mode().as_str(),
            read_only = policy.read_only,
            saas_mode = credentials.saas_mode(),
            "Database client initialized"
        );

        Ok(Self {
            mode: ModeCell::new(target.engine_mode()),
            current: Mutex::new(Current { target, policy }),
            manager,
            executor: QueryExecutor::new(config.result_format, config.show_column_types),
            discovery: DatabaseDiscovery::new(
                config.discovery.root.clone(),
                config.discovery.max_depth,
            ),
            credentials,
            read_only: config.read_only,
        })
    }

    /// Run `sql` and render the result.
    ///
    /// `target` overrides the current database for this query only, through
    /// a one-off connection; naming the current database is a no-op.
    pub async fn query(&self, sql: &str, target: Option<&str>) -> Result<String> {
        let current = self.current.lock().await;
        let lease = match target {
            Some(raw) if raw != current.target.raw_identifier() => {
                drop(current);
                self.one_off_lease(raw).await?
            }
            _ => {
                let lease = self.manager.acquire(&current.target, current.policy).await?;
                drop(current);
                lease
            }
        };
        self.executor.execute(lease, sql).await
    }

    /// Labels of every reachable database, one per line
    pub async fn list_databases(&self) -> Result<String> {
        let lines = self.discovery.list(&self.credentials).await?;
        Ok(lines.join("\n"))
    }

    /// Switch the current database.
    ///
    /// Resolution errors leave everything untouched. The previous persistent
    /// connection is closed once no query is using it. If the new target
    /// cannot be opened the previous target stays current and is reopened on
    /// the next query.
    pub async fn set_database(&self, raw: &str) -> Result<String> {
        let mut current = self.current.lock().await;

        let target = resolve(
            raw,
            &self.credentials,
            PathRequirement::for_read_only(self.read_only),
        )?;
        let policy = decide(&target, self.read_only)?;

        self.manager.activate(&target, policy).await?;

        tracing::info!(
            from = %current.target,
            to = %target,
            mode = target.engine_mode().as_str(),
            "Switched database"
        );
        let message = format!(
            "Switched to database `{}` ({}{})",
            target.raw_identifier(),
            target.engine_mode(),
            if policy.read_only { ", read-only" } else { "" }
        );
        self.mode.store(target.engine_mode());
        *current = Current { target, policy };
        Ok(message)
    }

    /// Raw identifier of the current database
    pub async fn get_database(&self) -> String {
        self.current.lock().await.target.raw_identifier().to_string()
    }

    /// Close the persistent connection, if any
    pub async fn shutdown(&self) -> Result<()> {
        self.manager.shutdown().await
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    pub fn result_format(&self) -> ResultFormat {
        self.executor.format()
    }

    /// Mode of the current database. Never waits on a running query or switch.
    pub fn current_mode(&self) -> EngineMode {
        self.mode.load()
    }

    async fn one_off_lease(&self, raw: &str) -> Result<ConnectionLease> {
        let target = resolve(
            raw,
            &self.credentials,
            PathRequirement::for_read_only(self.read_only),
        )?;
        let policy = decide(&target, self.read_only)?;
        tracing::debug!(db = %target, "Using one-off connection for target override");
        self.manager
            .acquire(
                &target,
                LeasePolicy {
                    lifetime: Lifetime::Ephemeral,
                    read_only: policy.read_only,
                },
            )
            .await
    }
}
