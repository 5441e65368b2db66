//! # Engram Schema
//!
//! Metadata layer for the Engram memory store: declarative domain models,
//! the immutable model registry built from them at process start, allow-list
//! validation for every identifier that reaches a statement, and idempotent
//! SurrealDB DDL generation.
//!
//! The layering is strict: this crate performs no I/O. `engram-query`
//! borrows the registry read-only while constructing statements, and
//! `engram-store` applies the generated DDL before accepting traffic.
//!
//! ```
//! use engram_schema::{generate, ModelRegistry};
//!
//! let registry = ModelRegistry::global();
//! let ddl = generate(registry);
//! assert!(ddl.iter().all(|s| s.contains("IF NOT EXISTS")));
//! ```

pub mod domain;
pub mod error;
pub mod generate;
pub mod model;
pub mod registry;
pub mod validate;

pub use domain::default_models;
pub use error::{SchemaError, ValidationError};
pub use generate::{generate, COSINE_FUNCTION, TEXT_ANALYZER};
pub use model::{
    is_safe_identifier, DeclaredType, FieldDescriptor, FieldSpec, IndexDef, ModelDescriptor,
    ModelSpec, SemanticType,
};
pub use registry::ModelRegistry;
pub use validate::FieldCheck;
