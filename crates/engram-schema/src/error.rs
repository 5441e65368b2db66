//! Error types for the schema layer.
//!
//! `SchemaError` covers metadata derivation and DDL generation problems and
//! is fatal at startup: serving traffic with inconsistent metadata is worse
//! than refusing to boot. `ValidationError` covers per-query identifier
//! checks and is fatal to the current query construction only.

use serde::{Deserialize, Serialize};

/// Errors raised while deriving model descriptors or generating DDL.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum SchemaError {
    #[error("invalid identifier '{0}': must match ^[A-Za-z_][A-Za-z0-9_]*$")]
    InvalidIdentifier(String),

    #[error("duplicate field '{field}' on model '{table}'")]
    DuplicateField { table: String, field: String },

    #[error("model '{table}' declares more than one vector field ('{first}' and '{second}')")]
    DuplicateVectorField {
        table: String,
        first: String,
        second: String,
    },

    #[error("index name '{index}' collides on model '{table}'")]
    DuplicateIndex { table: String, index: String },

    #[error("duplicate table '{0}' in registry")]
    DuplicateTable(String),

    #[error("model '{table}' has no fulltext field")]
    NoFulltextField { table: String },

    #[error("model '{table}' has no vector field")]
    NoVectorField { table: String },

    #[error("no registered model is marked as graph {0}")]
    NoGraphModel(&'static str),

    #[error("model registry is not initialized")]
    RegistryUninitialized,
}

/// Errors raised while validating identifiers against the allow-list.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum ValidationError {
    #[error("unknown table '{0}'")]
    UnknownTable(String),

    #[error("unsafe field name '{0}'")]
    UnsafeField(String),

    #[error("unsafe operator '{0}'")]
    UnsafeOperator(String),

    #[error("invalid order direction '{0}'")]
    InvalidDirection(String),

    #[error("depth {0} out of range [1, 10]")]
    DepthOutOfRange(i64),

    #[error("min_depth {min} exceeds max_depth {max}")]
    InvertedDepthRange { min: u32, max: u32 },

    #[error("graph traversal requires at least one seed entity id")]
    NoSeedEntities,

    #[error("{0}")]
    Invalid(String),
}
