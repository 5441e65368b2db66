//! Convenience retrieval wrappers composing builders with the executor.
//!
//! Every wrapper applies tenant scoping (`tenant_id` equality plus
//! `is_deleted = false`) before caller-supplied filters, and goes through
//! the same parameterized path as hand-built statements.

use std::collections::HashMap;

use serde_json::Value;

use engram_query::{
    collapse_by_distance, query, CombinedQueryBuilder, Direction, FullTextQueryBuilder,
    GraphQueryBuilder, Statement, VectorQueryBuilder,
};
use engram_schema::{ModelRegistry, ValidationError};

use crate::client::Store;
use crate::error::StoreResult;
use crate::executor::Row;

/// Options for a graph traversal.
#[derive(Debug, Clone)]
pub struct GraphSearch {
    pub entity_ids: Vec<String>,
    pub relation_type: Option<String>,
    pub min_depth: u32,
    pub max_depth: u32,
    pub order_by_distance: bool,
    pub limit: Option<u64>,
}

impl GraphSearch {
    pub fn new(entity_ids: Vec<String>) -> Self {
        Self {
            entity_ids,
            relation_type: None,
            min_depth: 1,
            max_depth: 1,
            order_by_distance: false,
            limit: None,
        }
    }
}

/// Options for a combined retrieval.
#[derive(Debug, Clone, Default)]
pub struct CombinedSearch {
    pub filters: Vec<(String, Value)>,
    pub fulltext: Option<String>,
    pub embedding: Option<Vec<f64>>,
    pub graph: Option<GraphSearch>,
    pub limit: Option<u64>,
}

/// Result of a combined retrieval. The two row sets come from independent
/// statements and are not transactional with each other.
#[derive(Debug, Clone, Default)]
pub struct CombinedResults {
    pub main: Vec<Row>,
    pub graph: Vec<Row>,
}

impl Store {
    /// Exact-match rows from `table`, tenant-scoped.
    pub async fn execute_exact_match_query(
        &self,
        table: &str,
        filters: Vec<(String, Value)>,
        tenant_id: &str,
        limit: Option<u64>,
    ) -> StoreResult<Vec<Row>> {
        let mut builder = query(table)
            .where_eq("tenant_id", tenant_id)
            .where_eq("is_deleted", false);
        for (field, value) in filters {
            builder = builder.where_eq(field, value);
        }
        if let Some(count) = limit {
            builder = builder.limit(count);
        }
        let statement = builder.build()?;
        self.execute(&statement).await
    }

    /// Similarity-ranked rows from the vector-flagged model.
    pub async fn execute_vector_query(
        &self,
        tenant_id: &str,
        embedding: Vec<f64>,
        limit: Option<u64>,
    ) -> StoreResult<Vec<Row>> {
        let mut builder = VectorQueryBuilder::new()?
            .with_embedding_similarity(embedding)
            .where_eq("tenant_id", tenant_id)
            .where_eq("is_deleted", false)
            .order_by("similarity_score", Direction::Desc);
        if let Some(count) = limit {
            builder = builder.limit(count);
        }
        let statement = builder.build()?;
        self.execute(&statement).await
    }

    /// Relevance-ranked rows from the fulltext-flagged model.
    pub async fn execute_fulltext_query(
        &self,
        tenant_id: &str,
        query_text: &str,
        limit: Option<u64>,
    ) -> StoreResult<Vec<Row>> {
        let mut builder = FullTextQueryBuilder::new()?
            .search(query_text)
            .where_eq("tenant_id", tenant_id)
            .where_eq("is_deleted", false);
        if let Some(count) = limit {
            builder = builder.limit(count);
        }
        let statement = builder.build()?;
        self.execute(&statement).await
    }

    /// Graph traversal from the given seeds, reduced to breadth-first rows
    /// (each node once, at its minimum distance, within the depth bounds).
    pub async fn execute_graph_query(
        &self,
        tenant_id: &str,
        search: GraphSearch,
    ) -> StoreResult<Vec<Row>> {
        let mut builder = GraphQueryBuilder::new()?
            .from_entities(search.entity_ids)
            .depth_range(search.min_depth, search.max_depth)
            .where_eq("tenant_id", tenant_id)
            .where_eq("is_deleted", false);
        if let Some(relation_type) = search.relation_type {
            builder = builder.where_eq("relation_type", relation_type);
        }
        if search.order_by_distance {
            builder = builder.order_by_distance();
        }
        if let Some(count) = search.limit {
            builder = builder.limit(count);
        }
        let statement = builder.build()?;
        let rows = self.execute(&statement).await?;
        Ok(collapse_by_distance(
            rows,
            search.min_depth,
            search.max_depth,
            search.order_by_distance,
        ))
    }

    /// Combined retrieval: one statement for the flat legs, an independent
    /// statement for the graph leg.
    pub async fn execute_combined_query(
        &self,
        tenant_id: &str,
        search: CombinedSearch,
    ) -> StoreResult<CombinedResults> {
        let mut builder = CombinedQueryBuilder::new()?
            .where_eq("tenant_id", tenant_id)
            .where_eq("is_deleted", false);
        for (field, value) in search.filters {
            builder = builder.where_eq(field, value);
        }
        if let Some(text) = search.fulltext {
            builder = builder.with_fulltext_search(text);
        }
        if let Some(embedding) = search.embedding {
            builder = builder.with_vector_similarity(embedding);
        }
        if let Some(count) = search.limit {
            builder = builder.limit(count);
        }

        let graph_bounds = search.graph.as_ref().map(|g| {
            (g.min_depth, g.max_depth, g.order_by_distance)
        });
        if let Some(graph) = search.graph {
            let tenant = tenant_id.to_string();
            builder = builder.with_graph_search(graph.entity_ids, move |mut g| {
                g = g
                    .depth_range(graph.min_depth, graph.max_depth)
                    .where_eq("tenant_id", tenant)
                    .where_eq("is_deleted", false);
                if let Some(relation_type) = graph.relation_type {
                    g = g.where_eq("relation_type", relation_type);
                }
                if graph.order_by_distance {
                    g = g.order_by_distance();
                }
                if let Some(count) = graph.limit {
                    g = g.limit(count);
                }
                g
            });
        }

        let plan = builder.build_all()?;
        let main = self.execute(&plan.main).await?;
        let graph = match (plan.graph, graph_bounds) {
            (Some(statement), Some((min, max, sorted))) => {
                let rows = self.execute(&statement).await?;
                collapse_by_distance(rows, min, max, sorted)
            }
            _ => Vec::new(),
        };
        Ok(CombinedResults { main, graph })
    }

    /// Parameterized upsert. The record content binds as one parameter and
    /// the table/id pass through `type::` functions, never into the text.
    pub async fn upsert_record(
        &self,
        table: &str,
        id: Option<&str>,
        data: Value,
    ) -> StoreResult<Vec<Row>> {
        ModelRegistry::global().validate_table(table)?;
        if !data.is_object() {
            return Err(ValidationError::Invalid(
                "record content must be an object".to_string(),
            )
            .into());
        }

        let mut params: HashMap<String, Value> = HashMap::new();
        params.insert("tb".to_string(), Value::from(table));
        params.insert("data".to_string(), data);
        let text = if let Some(id) = id {
            params.insert("id".to_string(), Value::from(id));
            "UPSERT type::thing($tb, $id) CONTENT $data".to_string()
        } else {
            "CREATE type::table($tb) CONTENT $data".to_string()
        };

        let statement = Statement { text, params };
        self.execute(&statement).await
    }

    /// Create a graph edge between two node records. Edges are written
    /// with RELATE so the traversal idiom can walk them; endpoint ids and
    /// the edge content all bind as parameters.
    pub async fn create_relation(
        &self,
        from: &str,
        to: &str,
        data: Value,
    ) -> StoreResult<Vec<Row>> {
        let edge_table = ModelRegistry::global().graph_edge()?.table.clone();
        if !data.is_object() {
            return Err(ValidationError::Invalid(
                "relation content must be an object".to_string(),
            )
            .into());
        }

        let mut params: HashMap<String, Value> = HashMap::new();
        params.insert("from".to_string(), Value::from(from));
        params.insert("to".to_string(), Value::from(to));
        params.insert("data".to_string(), data);
        let text = format!(
            "RELATE (type::record($from))->{edge_table}->(type::record($to)) CONTENT $data"
        );

        let statement = Statement { text, params };
        self.execute(&statement).await
    }
}
