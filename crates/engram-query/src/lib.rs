//! Parameterized statement construction for multi-modal retrieval.
//!
//! Four query shapes over the same tenant-scoped records: exact-match
//! filtering ([`QueryBuilder`]), vector similarity ([`VectorQueryBuilder`]),
//! fulltext search ([`FullTextQueryBuilder`]) and multi-hop graph traversal
//! ([`GraphQueryBuilder`]), plus a [`CombinedQueryBuilder`] merging the
//! flat shapes into one statement. Builders are pure: they validate
//! identifiers against the [`engram_schema`] registry and render text with
//! `$pN` placeholders, never embedding a value or unchecked identifier.
//! Execution lives in the store crate.
//!
//! ```
//! use engram_query::{query, Direction};
//!
//! let stmt = query("entity")
//!     .where_eq("tenant_id", "t1")
//!     .where_eq("is_deleted", false)
//!     .order_by("created_at", Direction::Desc)
//!     .limit(10)
//!     .build()
//!     .unwrap();
//! assert!(stmt.text.starts_with("SELECT * FROM entity"));
//! assert_eq!(stmt.params.len(), 2);
//! ```

pub mod builder;
pub mod combined;
pub mod error;
pub mod fulltext;
pub mod graph;
pub mod param;
pub mod similarity;
pub mod vector;

pub use builder::{query, Direction, Operator, QueryBuilder};
pub use combined::{CombinedQueryBuilder, QueryPlan};
pub use error::QueryError;
pub use fulltext::FullTextQueryBuilder;
pub use graph::{
    collapse_by_distance, GraphQueryBuilder, MAX_TRAVERSAL_DEPTH, MIN_TRAVERSAL_DEPTH,
};
pub use param::{ParamBag, Statement};
pub use similarity::cosine_similarity;
pub use vector::VectorQueryBuilder;
