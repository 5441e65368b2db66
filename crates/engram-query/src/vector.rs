//! Vector-similarity query construction.

use engram_schema::{ModelRegistry, SchemaError, COSINE_FUNCTION};
use serde_json::Value;

use crate::builder::{Direction, Operator, QueryBuilder};
use crate::error::QueryError;
use crate::param::Statement;

/// Builder for similarity-scored SELECTs over the vector-flagged model.
///
/// Wraps a [`QueryBuilder`] and adds a `similarity_score` projection plus an
/// implicit non-null guard on the stored vector. Sorting by the score is left
/// to the caller via [`order_by`](Self::order_by); nothing is sorted
/// implicitly.
#[derive(Debug, Clone)]
pub struct VectorQueryBuilder {
    inner: QueryBuilder,
    vector_field: String,
}

impl VectorQueryBuilder {
    /// Target the registry's vector-flagged model.
    pub fn new() -> Result<Self, QueryError> {
        Self::with_registry(ModelRegistry::global())
    }

    pub fn with_registry(registry: &'static ModelRegistry) -> Result<Self, QueryError> {
        let model = registry.vector_model()?;
        let vector_field = model.vector_field.clone().ok_or(SchemaError::NoVectorField {
            table: model.table.clone(),
        })?;
        Ok(Self {
            inner: QueryBuilder::with_registry(registry, model.table.clone()),
            vector_field,
        })
    }

    /// Score each row by cosine similarity against `query_vector` and keep
    /// only rows with a stored vector.
    pub fn with_embedding_similarity(mut self, query_vector: Vec<f64>) -> Self {
        let key = self.inner.push_param(query_vector);
        self.inner.computed_projection(
            format!(
                "fn::{COSINE_FUNCTION}({field}, ${key}) AS similarity_score",
                field = self.vector_field
            ),
            "similarity_score",
        );
        self.inner = self.inner.where_not_null(self.vector_field.clone());
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

    pub fn build(self) -> Result<Statement, QueryError> {
        self.inner.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similarity_scenario() {
        let built = VectorQueryBuilder::new()
            .unwrap()
            .with_embedding_similarity(vec![0.1, 0.2, 0.3])
            .where_eq("tenant_id", "t1")
            .limit(5)
            .build()
            .unwrap();

        assert!(built.text.contains("AS similarity_score"));
        assert!(built.text.contains("fn::cosine_similarity(embedding, $p0)"));
        assert!(built.text.contains("embedding IS NOT NONE"));
        assert!(built.text.contains("tenant_id = $p1"));
        assert!(built.text.ends_with("LIMIT 5"));
        assert_eq!(built.params.len(), 2);
    }

    #[test]
    fn embedding_binds_as_a_parameter() {
        let built = VectorQueryBuilder::new()
            .unwrap()
            .with_embedding_similarity(vec![0.25, 0.75])
            .build()
            .unwrap();
        assert!(!built.text.contains("0.25"));
        assert_eq!(built.params["p0"], serde_json::json!([0.25, 0.75]));
    }

    #[test]
    fn no_implicit_score_ordering() {
        let built = VectorQueryBuilder::new()
            .unwrap()
            .with_embedding_similarity(vec![1.0])
            .build()
            .unwrap();
        assert!(!built.text.contains("ORDER BY"));
    }

    #[test]
    fn caller_may_sort_by_score_alias() {
        let built = VectorQueryBuilder::new()
            .unwrap()
            .with_embedding_similarity(vec![1.0])
            .order_by("similarity_score", Direction::Desc)
            .build()
            .unwrap();
        assert!(built.text.contains("ORDER BY similarity_score DESC"));
    }
}
