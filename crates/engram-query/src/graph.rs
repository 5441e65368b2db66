//! Graph traversal query construction and result post-processing.
//!
//! A traversal renders one SELECT arm per depth from 1 up to the
//! configured maximum, each projecting its literal depth `AS distance`
//! and walking that many outgoing edges from the seed records. The arms
//! are merged into a single result set with `array::flatten`. Arms below
//! the requested minimum depth are rendered on purpose: a node first
//! reachable at depth 2 must not count as "at depth 4" just because a
//! longer path also exists, so [`collapse_by_distance`] first reduces
//! rows to each node's minimum distance and only then applies the
//! requested bounds.

use serde_json::Value;

use engram_schema::{ModelRegistry, ValidationError};

use crate::builder::Operator;
use crate::error::QueryError;
use crate::param::{ParamBag, Statement};

pub const MIN_TRAVERSAL_DEPTH: u32 = 1;
pub const MAX_TRAVERSAL_DEPTH: u32 = 10;

fn check_depth(depth: u32) -> Result<(), ValidationError> {
    if (MIN_TRAVERSAL_DEPTH..=MAX_TRAVERSAL_DEPTH).contains(&depth) {
        Ok(())
    } else {
        Err(ValidationError::DepthOutOfRange(i64::from(depth)))
    }
}

/// Builder for multi-hop traversals over the registry's graph node and
/// edge models.
#[derive(Debug, Clone)]
pub struct GraphQueryBuilder {
    registry: &'static ModelRegistry,
    node_table: String,
    edge_table: String,
    seeds: Vec<String>,
    targets: Vec<String>,
    min_depth: u32,
    max_depth: u32,
    edge_predicates: Vec<(String, Operator, Value)>,
    order_by_distance: bool,
    limit: Option<u64>,
    params: ParamBag,
    error: Option<QueryError>,
}

impl GraphQueryBuilder {
    pub fn new() -> Result<Self, QueryError> {
        Self::with_registry(ModelRegistry::global())
    }

    pub fn with_registry(registry: &'static ModelRegistry) -> Result<Self, QueryError> {
        Self::with_params(registry, ParamBag::new())
    }

    pub(crate) fn with_params(
        registry: &'static ModelRegistry,
        params: ParamBag,
    ) -> Result<Self, QueryError> {
        let node_table = registry.graph_node()?.table.clone();
        let edge_table = registry.graph_edge()?.table.clone();
        Ok(Self {
            registry,
            node_table,
            edge_table,
            seeds: Vec::new(),
            targets: Vec::new(),
            min_depth: MIN_TRAVERSAL_DEPTH,
            max_depth: MIN_TRAVERSAL_DEPTH,
            edge_predicates: Vec::new(),
            order_by_distance: false,
            limit: None,
            params,
            error: None,
        })
    }

    /// Seed record ids the traversal starts from. Required.
    pub fn from_entities(mut self, entity_ids: Vec<impl Into<String>>) -> Self {
        self.seeds.extend(entity_ids.into_iter().map(Into::into));
        self
    }

    /// Restrict results to paths terminating in this set.
    pub fn to_entities(mut self, entity_ids: Vec<impl Into<String>>) -> Self {
        self.targets.extend(entity_ids.into_iter().map(Into::into));
        self
    }

    pub fn min_depth(mut self, depth: u32) -> Self {
        match check_depth(depth) {
            Ok(()) => self.min_depth = depth,
            Err(err) => self.fail(err),
        }
        self
    }

    pub fn max_depth(mut self, depth: u32) -> Self {
        match check_depth(depth) {
            Ok(()) => self.max_depth = depth,
            Err(err) => self.fail(err),
        }
        self
    }

    /// Set both bounds at once. Out-of-range values are rejected, never
    /// clamped.
    pub fn depth_range(mut self, min: u32, max: u32) -> Self {
        if let Err(err) = check_depth(min).and_then(|()| check_depth(max)) {
            self.fail(err);
            return self;
        }
        if min > max {
            self.fail(ValidationError::InvertedDepthRange { min, max });
            return self;
        }
        self.min_depth = min;
        self.max_depth = max;
        self
    }

    /// Equality filter evaluated against traversed edges.
    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_op(field, Operator::Eq, value)
    }

    pub fn where_op(
        mut self,
        field: impl Into<String>,
        op: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.edge_predicates.push((field.into(), op, value.into()));
        self
    }

    /// Ascending distance ordering; equal distances keep store order.
    pub fn order_by_distance(mut self) -> Self {
        self.order_by_distance = true;
        self
    }

    pub fn limit(mut self, count: u64) -> Self {
        self.limit = Some(count);
        self
    }

    pub fn bounds(&self) -> (u32, u32) {
        (self.min_depth, self.max_depth)
    }

    pub fn build(mut self) -> Result<Statement, QueryError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if self.seeds.is_empty() {
            return Err(ValidationError::NoSeedEntities.into());
        }
        if self.min_depth > self.max_depth {
            return Err(ValidationError::InvertedDepthRange {
                min: self.min_depth,
                max: self.max_depth,
            }
            .into());
        }
        for (field, _, _) in &self.edge_predicates {
            self.registry.validate_field(&self.edge_table, field)?;
        }

        // Seed ids bind one parameter each; type::record turns the bound
        // strings back into record ids the traversal can start from.
        let seed_refs: Vec<String> = std::mem::take(&mut self.seeds)
            .into_iter()
            .map(|seed| {
                let key = self.params.push(Value::from(seed));
                format!("type::record(${key})")
            })
            .collect();
        let seed_list = format!("[{}]", seed_refs.join(", "));

        let mut edge_clauses: Vec<String> = Vec::new();
        for (field, op, value) in std::mem::take(&mut self.edge_predicates) {
            let key = self.params.push(value);
            edge_clauses.push(match op {
                Operator::IsNull => format!("{field} IS NONE"),
                Operator::IsNotNull => format!("{field} IS NOT NONE"),
                other => format!("{field} {} ${key}", other.as_sql()),
            });
        }
        let hop = if edge_clauses.is_empty() {
            format!("->{}->{}", self.edge_table, self.node_table)
        } else {
            format!(
                "->({} WHERE {})->{}",
                self.edge_table,
                edge_clauses.join(" AND "),
                self.node_table
            )
        };

        let target_filter = if self.targets.is_empty() {
            String::new()
        } else {
            let target_refs: Vec<String> = std::mem::take(&mut self.targets)
                .into_iter()
                .map(|target| {
                    let key = self.params.push(Value::from(target));
                    format!("type::record(${key})")
                })
                .collect();
            format!(" WHERE id IN [{}]", target_refs.join(", "))
        };

        let arms: Vec<String> = (MIN_TRAVERSAL_DEPTH..=self.max_depth)
            .map(|depth| {
                let hops = hop.repeat(depth as usize);
                format!(
                    "(SELECT *, {depth} AS distance \
                     FROM array::flatten((SELECT VALUE {hops} FROM {seed_list})){target_filter})"
                )
            })
            .collect();

        let mut text = format!("SELECT * FROM array::flatten([{}])", arms.join(", "));
        if self.order_by_distance {
            text.push_str(" ORDER BY distance ASC");
        }
        if let Some(count) = self.limit {
            text.push_str(&format!(" LIMIT {count}"));
        }

        Ok(Statement {
            text,
            params: self.params.into_params(),
        })
    }

    fn fail(&mut self, err: ValidationError) {
        if self.error.is_none() {
            self.error = Some(err.into());
        }
    }
}

/// Reduce raw traversal rows to breadth-first results: one row per record
/// id at its minimum distance, bounds applied after collapsing, optional
/// stable ascending sort.
pub fn collapse_by_distance(
    rows: Vec<Value>,
    min_depth: u32,
    max_depth: u32,
    sort: bool,
) -> Vec<Value> {
    let mut order: Vec<String> = Vec::new();
    let mut best: std::collections::HashMap<String, Value> = std::collections::HashMap::new();

    for row in rows {
        let Some(id) = row.get("id") else { continue };
        let Some(distance) = row_distance(&row) else {
            continue;
        };
        let key = id.to_string();
        match best.get(&key) {
            Some(existing) if row_distance(existing).is_some_and(|d| d <= distance) => {}
            Some(_) => {
                best.insert(key, row);
            }
            None => {
                order.push(key.clone());
                best.insert(key, row);
            }
        }
    }

    let mut collapsed: Vec<Value> = order
        .into_iter()
        .filter_map(|key| best.remove(&key))
        .filter(|row| {
            row_distance(row)
                .is_some_and(|d| d >= u64::from(min_depth) && d <= u64::from(max_depth))
        })
        .collect();

    if sort {
        collapsed.sort_by_key(|row| row_distance(row).unwrap_or(u64::MAX));
    }
    collapsed
}

fn row_distance(row: &Value) -> Option<u64> {
    row.get("distance").and_then(Value::as_u64)
}
