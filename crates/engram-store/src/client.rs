//! SurrealDB connection handle and schema bring-up.

use std::sync::Arc;

use surrealdb::engine::local::Db;
use surrealdb::Surreal;
use tracing::{debug, info};

use engram_schema::{generate, ModelRegistry, COSINE_FUNCTION};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};

/// Handle to a SurrealDB instance.
///
/// Arc-wrapped internally so cloning is cheap and never opens a second
/// connection; with the RocksDB engine a second open would fail on the
/// file lock.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

pub(crate) struct StoreInner {
    pub(crate) db: Surreal<Db>,
    pub(crate) config: StoreConfig,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("config", &self.inner.config)
            .finish()
    }
}

impl Store {
    /// Open a connection per `config` and select its namespace/database.
    pub async fn connect(config: StoreConfig) -> StoreResult<Self> {
        use surrealdb::engine::local::{Mem, RocksDb};

        let db = if config.is_memory() {
            Surreal::new::<Mem>(())
                .await
                .map_err(|e| StoreError::Connection(format!("in-memory engine: {e}")))?
        } else {
            Surreal::new::<RocksDb>(config.path.as_str())
                .await
                .map_err(|e| {
                    StoreError::Connection(format!("rocksdb engine at {}: {e}", config.path))
                })?
        };

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(|e| {
                StoreError::Connection(format!(
                    "namespace '{}' database '{}': {e}",
                    config.namespace, config.database
                ))
            })?;

        Ok(Self {
            inner: Arc::new(StoreInner { db, config }),
        })
    }

    /// In-memory store, mostly for tests and local development.
    pub async fn memory() -> StoreResult<Self> {
        Self::connect(StoreConfig::memory()).await
    }

    pub(crate) fn db(&self) -> &Surreal<Db> {
        &self.inner.db
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Run every generated DDL statement against the connection, then probe
    /// the capabilities queries rely on. Must complete before any query
    /// traffic; racing schema creation against reads on a cold store is
    /// not safe.
    pub async fn init_schema(&self, registry: &ModelRegistry) -> StoreResult<()> {
        let statements = generate(registry);
        for statement in &statements {
            self.inner
                .db
                .query(statement.as_str())
                .await
                .map_err(|e| StoreError::Query(format!("schema statement failed: {e}")))?
                .check()
                .map_err(|e| StoreError::Query(format!("schema statement rejected: {e}")))?;
            debug!(statement = statement.as_str(), "applied");
        }
        self.probe_capabilities().await?;
        info!(statements = statements.len(), "schema initialized");
        Ok(())
    }

    /// Reject a backend that cannot bind parameters or is missing the
    /// provisioned similarity function.
    async fn probe_capabilities(&self) -> StoreResult<()> {
        let mut response = self
            .inner
            .db
            .query("RETURN $probe")
            .bind(("probe", "ok"))
            .await
            .map_err(|e| StoreError::Connection(format!("parameter binding probe: {e}")))?;
        let echoed: Option<String> = response
            .take(0)
            .map_err(|e| StoreError::Connection(format!("parameter binding probe: {e}")))?;
        if echoed.as_deref() != Some("ok") {
            return Err(StoreError::Connection(
                "backend does not support parameter binding".to_string(),
            ));
        }

        let mut response = self
            .inner
            .db
            .query(format!("RETURN fn::{COSINE_FUNCTION}([1.0, 0.0], [1.0, 0.0])"))
            .await
            .map_err(|e| StoreError::Connection(format!("function probe: {e}")))?;
        let score: Option<f64> = response
            .take(0)
            .map_err(|e| StoreError::Connection(format!("function probe: {e}")))?;
        if score != Some(1.0) {
            return Err(StoreError::Connection(format!(
                "fn::{COSINE_FUNCTION} is not provisioned"
            )));
        }
        Ok(())
    }
}
