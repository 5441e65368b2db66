//! Fulltext query construction against the search-indexed model.

use engram_schema::{ModelRegistry, SchemaError};

use serde_json::Value;

use crate::builder::{Direction, Operator, QueryBuilder};
use crate::error::QueryError;
use crate::param::Statement;

/// Builder for relevance-scored fulltext SELECTs.
///
/// Resolves the fulltext-flagged model at construction; a registry without
/// one is a [`SchemaError::NoFulltextField`]. The match predicate renders
/// first in the WHERE clause so the search index drives the scan.
#[derive(Debug, Clone)]
pub struct FullTextQueryBuilder {
    inner: QueryBuilder,
    text_field: String,
    searching: bool,
}

impl FullTextQueryBuilder {
    pub fn new() -> Result<Self, QueryError> {
        Self::with_registry(ModelRegistry::global())
    }

    pub fn with_registry(registry: &'static ModelRegistry) -> Result<Self, QueryError> {
        let model = registry.fulltext_model()?;
        let text_field =
            model
                .fulltext_fields
                .first()
                .cloned()
                .ok_or(SchemaError::NoFulltextField {
                    table: model.table.clone(),
                })?;
        Ok(Self {
            inner: QueryBuilder::with_registry(registry, model.table.clone()),
            text_field,
            searching: false,
        })
    }

    /// Match rows against `query_text` and project `relevance_score`.
    pub fn search(mut self, query_text: impl Into<String>) -> Self {
        let key = self.inner.push_param(query_text.into());
        // The match reference in `@0@` is what `search::score(0)` reads.
        self.inner
            .raw_predicate_first(format!("{} @0@ ${key}", self.text_field));
        self.inner.computed_projection(
            "search::score(0) AS relevance_score".to_string(),
            "relevance_score",
        );
        self.searching = true;
        self
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inner = self.inner.where_eq(field, value);
        self
    }

    pub fn where_op(
        mut self,
        field: impl Into<String>,
        op: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.inner = self.inner.where_op(field, op, value);
        self
    }

    pub fn where_in(mut self, field: impl Into<String>, values: Vec<impl Into<Value>>) -> Self {
        self.inner = self.inner.where_in(field, values);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.inner = self.inner.order_by(field, direction);
        self
    }

    pub fn limit(mut self, count: u64) -> Self {
        self.inner = self.inner.limit(count);
        self
    }

    /// Default to relevance ordering when a search is active and the caller
    /// gave no explicit ordering.
    pub fn build(mut self) -> Result<Statement, QueryError> {
        if self.searching && !self.inner.has_explicit_order() {
            self.inner = self.inner.order_by("relevance_score", Direction::Desc);
        }
        self.inner.build()
    }
}
