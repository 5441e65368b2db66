//! Combined retrieval: exact-match, fulltext and vector legs share one
//! statement over the flat projection of a single table; graph traversal
//! always renders as a second, independent statement because path
//! expansion cannot be flattened into the same projection. The two
//! statements are executed separately and are not transactional.

use serde_json::Value;

use engram_schema::{ModelRegistry, SchemaError, COSINE_FUNCTION};

use crate::builder::{Direction, Operator, QueryBuilder};
use crate::error::QueryError;
use crate::graph::GraphQueryBuilder;
use crate::param::{ParamBag, Statement};

/// The statements produced by [`CombinedQueryBuilder::build_all`].
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub main: Statement,
    pub graph: Option<Statement>,
}

/// Builder merging exact-match filters with optional fulltext and vector
/// scoring, plus an optional graph traversal side-statement.
///
/// `main` rows always expose both `similarity_score` and `relevance_score`
/// keys; a leg that was not requested projects `NONE` for its key so
/// callers can read both fields uniformly.
#[derive(Debug, Clone)]
pub struct CombinedQueryBuilder {
    inner: QueryBuilder,
    vector_field: Option<String>,
    text_field: Option<String>,
    use_vector: bool,
    use_fulltext: bool,
    graph: Option<GraphQueryBuilder>,
}

impl CombinedQueryBuilder {
    pub fn new() -> Result<Self, QueryError> {
        Self::with_registry(ModelRegistry::global())
    }

    /// Targets the model carrying a vector or fulltext annotation.
    pub fn with_registry(registry: &'static ModelRegistry) -> Result<Self, QueryError> {
        let model = registry
            .vector_model()
            .or_else(|_| registry.fulltext_model())?;
        Ok(Self {
            inner: QueryBuilder::with_registry(registry, model.table.clone()),
            vector_field: model.vector_field.clone(),
            text_field: model.fulltext_fields.first().cloned(),
            use_vector: false,
            use_fulltext: false,
            graph: None,
        })
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

    /// Add the vector leg.
    pub fn with_vector_similarity(mut self, query_vector: Vec<f64>) -> Self {
        let Some(field) = self.vector_field.clone() else {
            self.inner
                .record_error(QueryError::Schema(SchemaError::NoVectorField {
                    table: self.inner.table_name().to_string(),
                }));
            return self;
        };
        let key = self.inner.push_param(query_vector);
        self.inner.computed_projection(
            format!("fn::{COSINE_FUNCTION}({field}, ${key}) AS similarity_score"),
            "similarity_score",
        );
        self.inner = self.inner.where_not_null(field);
        self.use_vector = true;
        self
    }

    /// Add the fulltext leg.
    pub fn with_fulltext_search(mut self, query_text: impl Into<String>) -> Self {
        let Some(field) = self.text_field.clone() else {
            self.inner
                .record_error(QueryError::Schema(SchemaError::NoFulltextField {
                    table: self.inner.table_name().to_string(),
                }));
            return self;
        };
        let key = self.inner.push_param(query_text.into());
        self.inner.raw_predicate_first(format!("{field} @0@ ${key}"));
        self.inner.computed_projection(
            "search::score(0) AS relevance_score".to_string(),
            "relevance_score",
        );
        self.use_fulltext = true;
        self
    }

    /// Add the graph side-statement. The traversal builder is seeded here
    /// and further shaped by `configure`; its parameters carry a `graph_`
    /// prefix so the two statements never collide on keys.
    pub fn with_graph_search<F>(mut self, entity_ids: Vec<impl Into<String>>, configure: F) -> Self
    where
        F: FnOnce(GraphQueryBuilder) -> GraphQueryBuilder,
    {
        match GraphQueryBuilder::with_params(self.inner.registry(), ParamBag::with_prefix("graph_"))
        {
            Ok(builder) => {
                self.graph = Some(configure(builder.from_entities(entity_ids)));
            }
            Err(err) => self.inner.record_error(err),
        }
        self
    }

    /// Build only the `main` statement.
    pub fn build(self) -> Result<Statement, QueryError> {
        Ok(self.build_all()?.main)
    }

    pub fn build_all(mut self) -> Result<QueryPlan, QueryError> {
        // A leg that was not requested still projects its score key.
        if !self.use_vector {
            self.inner
                .computed_projection("NONE AS similarity_score".to_string(), "similarity_score");
        }
        if !self.use_fulltext {
            self.inner
                .computed_projection("NONE AS relevance_score".to_string(), "relevance_score");
        }

        if !self.inner.has_explicit_order() {
            if self.use_vector {
                self.inner = self.inner.order_by("similarity_score", Direction::Desc);
            }
            if self.use_fulltext {
                self.inner = self.inner.order_by("relevance_score", Direction::Desc);
            }
        }

        let main = self.inner.build()?;
        let graph = self.graph.map(GraphQueryBuilder::build).transpose()?;
        Ok(QueryPlan { main, graph })
    }
}
