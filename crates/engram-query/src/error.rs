//! Query-construction errors.

use engram_schema::{SchemaError, ValidationError};

/// Error raised while constructing a query. Always raised before any I/O;
/// a failed construction yields no partial statement.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
