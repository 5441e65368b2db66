//! Store configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for the SurrealDB backend.
///
/// An empty or `":memory:"` path selects the in-memory engine; anything
/// else is a directory for the RocksDB engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub namespace: String,
    pub database: String,
    pub path: String,
    /// Per-call execution deadline in seconds.
    pub timeout_seconds: u64,
    /// Calls slower than this many milliseconds are logged.
    pub slow_query_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            namespace: "engram".to_string(),
            database: "main".to_string(),
            path: "./engram.db".to_string(),
            timeout_seconds: 30,
            slow_query_ms: 1_000,
        }
    }
}

impl StoreConfig {
    pub fn memory() -> Self {
        Self {
            path: ":memory:".to_string(),
            ..Self::default()
        }
    }

    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn is_memory(&self) -> bool {
        self.path.is_empty() || self.path == ":memory:"
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn slow_query_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_query_ms)
    }
}
