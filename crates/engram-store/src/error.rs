//! Error taxonomy for statement execution.
//!
//! `Connection` and `Timeout` are transient and eligible for caller-driven
//! retry; this layer never retries silently. `Constraint` is permanent.
//! `Validation` should not reach execution at all since builders validate
//! before rendering; it is kept for the defensive re-check.

use engram_query::QueryError;
use engram_schema::{SchemaError, ValidationError};
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("query error: {0}")]
    Query(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<QueryError> for StoreError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Validation(e) => Self::Validation(e),
            QueryError::Schema(e) => Self::Schema(e),
        }
    }
}

impl StoreError {
    /// Whether a caller may reasonably retry the operation with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(StoreError::Connection("refused".into()).is_transient());
        assert!(StoreError::Timeout(std::time::Duration::from_secs(30)).is_transient());
        assert!(!StoreError::Constraint("unique index".into()).is_transient());
        assert!(!StoreError::Query("parse".into()).is_transient());
    }
}
