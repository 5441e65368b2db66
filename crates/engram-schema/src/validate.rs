//! Allow-list validation for tables and fields.
//!
//! Every identifier that a builder embeds in statement text passes through
//! here first. The outcome for fields is deliberately three-tier: a field
//! registered on some model is `Known`; a field we have never seen but that
//! matches the safe identifier pattern is `UnknownButSafe` (logged, not
//! blocked, so partially-typed tenant data keeps working); anything else is
//! `Unsafe` and fatal. Unknown tables are always fatal.

use tracing::warn;

use crate::error::ValidationError;
use crate::model::{is_safe_identifier, FieldDescriptor, ModelDescriptor};
use crate::registry::ModelRegistry;

/// Result of checking a field name against the allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCheck<'a> {
    /// Registered on the model (or any model, for cross-table fields).
    Known(&'a FieldDescriptor),
    /// Not registered anywhere, but syntactically safe to embed.
    UnknownButSafe,
    /// Fails the identifier pattern; must never reach a statement.
    Unsafe,
}

impl FieldCheck<'_> {
    /// Whether the field may be embedded in statement text.
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Self::Unsafe)
    }
}

impl ModelRegistry {
    /// Validate a table name. Unknown or unsafe tables are always fatal.
    pub fn validate_table(&self, table: &str) -> Result<&ModelDescriptor, ValidationError> {
        if !is_safe_identifier(table) {
            return Err(ValidationError::UnknownTable(table.to_string()));
        }
        self.model(table)
            .ok_or_else(|| ValidationError::UnknownTable(table.to_string()))
    }

    /// Classify a field name against the allow-list.
    ///
    /// Prefers the descriptor on `table`'s own model; falls back to any
    /// model declaring the field, then to the pattern check.
    pub fn check_field<'a>(&'a self, table: &str, field: &str) -> FieldCheck<'a> {
        if let Some(model) = self.model(table) {
            if let Some(descriptor) = model.field(field) {
                return FieldCheck::Known(descriptor);
            }
        }
        if self.has_field(field) {
            if let Some(descriptor) = self
                .models()
                .find_map(|m| m.field(field))
            {
                return FieldCheck::Known(descriptor);
            }
        }
        if is_safe_identifier(field) {
            warn!(field, table, "field not registered on any model, allowing by pattern");
            FieldCheck::UnknownButSafe
        } else {
            FieldCheck::Unsafe
        }
    }

    /// Validate a field name, returning its descriptor when registered.
    ///
    /// The `UnknownButSafe` tier maps to `Ok(None)` so callers can proceed
    /// without conflating it with a registered field.
    pub fn validate_field<'a>(
        &'a self,
        table: &str,
        field: &str,
    ) -> Result<Option<&'a FieldDescriptor>, ValidationError> {
        match self.check_field(table, field) {
            FieldCheck::Known(descriptor) => Ok(Some(descriptor)),
            FieldCheck::UnknownButSafe => Ok(None),
            FieldCheck::Unsafe => Err(ValidationError::UnsafeField(field.to_string())),
        }
    }
}
