//! SurrealDB execution backend.
//!
//! [`Store`] owns the connection (in-memory or RocksDB), applies the
//! generated schema at startup, and executes builder-produced statements
//! with parameter binding, per-call deadlines, and a transient/permanent
//! error taxonomy. The retrieval wrappers in [`retrieve`] compose the
//! builders from `engram_query` with tenant scoping applied.
//!
//! ```no_run
//! use engram_schema::ModelRegistry;
//! use engram_store::{Store, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Store::connect(StoreConfig::memory()).await?;
//!     store.init_schema(ModelRegistry::global()).await?;
//!     let rows = store
//!         .execute_exact_match_query("entity", vec![], "tenant-1", Some(10))
//!         .await?;
//!     println!("{} rows", rows.len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod retrieve;

pub use client::Store;
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use executor::Row;
pub use retrieve::{CombinedResults, CombinedSearch, GraphSearch};
