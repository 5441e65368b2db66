//! Base fluent query builder.
//!
//! Accumulates predicates, projection, ordering and limits, then renders a
//! parameterized SurrealQL SELECT. Identifier validation runs at `build()`
//! against the model registry; a failed validation aborts construction and
//! no partial statement is returned. `build()` consumes the builder, so a
//! finalized builder cannot be mutated or reused; clone before building if
//! a variant is needed.

use serde_json::Value;
use tracing::debug;

use engram_schema::{ModelRegistry, ValidationError};

use crate::error::QueryError;
use crate::param::{ParamBag, Statement};

/// Comparison operators accepted by [`QueryBuilder::where_op`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

impl Operator {
    pub(crate) fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::IsNull => "IS NONE",
            Self::IsNotNull => "IS NOT NONE",
        }
    }
}

/// Sort direction for [`QueryBuilder::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
enum Predicate {
    Compare {
        field: String,
        op: Operator,
        key: String,
    },
    InList {
        field: String,
        key: String,
        negated: bool,
    },
    Null {
        field: String,
        negated: bool,
    },
    /// Pre-validated fragment appended by a specialized builder. Only
    /// registry-checked identifiers and `$key` placeholders ever land here.
    Raw(String),
}

/// Fluent builder for parameterized SELECT statements.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    registry: &'static ModelRegistry,
    table: String,
    select: Vec<String>,
    computed: Vec<String>,
    aliases: Vec<String>,
    predicates: Vec<Predicate>,
    order: Vec<(String, Direction)>,
    limit: Option<u64>,
    start: Option<u64>,
    params: ParamBag,
    error: Option<QueryError>,
}

impl QueryBuilder {
    /// Builder over the process-wide registry.
    pub fn new(table: impl Into<String>) -> Self {
        Self::with_registry(ModelRegistry::global(), table)
    }

    /// Builder over an explicit registry (tests, embedded setups).
    pub fn with_registry(registry: &'static ModelRegistry, table: impl Into<String>) -> Self {
        Self {
            registry,
            table: table.into(),
            select: Vec::new(),
            computed: Vec::new(),
            aliases: Vec::new(),
            predicates: Vec::new(),
            order: Vec::new(),
            limit: None,
            start: None,
            params: ParamBag::new(),
            error: None,
        }
    }

    /// `field = value`
    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_op(field, Operator::Eq, value)
    }

    /// `field IN values`. The whole list binds as one array parameter.
    pub fn where_in(self, field: impl Into<String>, values: Vec<impl Into<Value>>) -> Self {
        let list: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.where_op(field, Operator::In, Value::Array(list))
    }

    /// `field NOT IN values`
    pub fn where_not_in(self, field: impl Into<String>, values: Vec<impl Into<Value>>) -> Self {
        let list: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.where_op(field, Operator::NotIn, Value::Array(list))
    }

    /// `field IS NONE`
    pub fn where_null(mut self, field: impl Into<String>) -> Self {
        self.predicates.push(Predicate::Null {
            field: field.into(),
            negated: false,
        });
        self
    }

    /// `field IS NOT NONE`
    pub fn where_not_null(mut self, field: impl Into<String>) -> Self {
        self.predicates.push(Predicate::Null {
            field: field.into(),
            negated: true,
        });
        self
    }

    /// Add a predicate with an explicit operator. The value always binds as
    /// a parameter, never as a literal in the statement text.
    pub fn where_op(
        mut self,
        field: impl Into<String>,
        op: Operator,
        value: impl Into<Value>,
    ) -> Self {
        let field = field.into();
        match op {
            Operator::IsNull => return self.where_null(field),
            Operator::IsNotNull => return self.where_not_null(field),
            Operator::In | Operator::NotIn => {
                let value = value.into();
                if !value.is_array() {
                    self.fail(ValidationError::Invalid(format!(
                        "{} operator requires an array value",
                        op.as_sql()
                    )));
                    return self;
                }
                let key = self.params.push(value);
                self.predicates.push(Predicate::InList {
                    field,
                    key,
                    negated: op == Operator::NotIn,
                });
            }
            _ => {
                let key = self.params.push(value);
                self.predicates.push(Predicate::Compare { field, op, key });
            }
        }
        self
    }

    /// Restrict the projection to the given fields.
    pub fn select(mut self, fields: Vec<impl Into<String>>) -> Self {
        self.select = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order.push((field.into(), direction));
        self
    }

    pub fn limit(mut self, count: u64) -> Self {
        self.limit = Some(count);
        self
    }

    /// Offset into the result set (SurrealQL `START`).
    pub fn start(mut self, offset: u64) -> Self {
        self.start = Some(offset);
        self
    }

    /// Finalize: validate every referenced identifier, then render the
    /// statement and hand over the parameter map.
    pub fn build(mut self) -> Result<Statement, QueryError> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }

        self.registry.validate_table(&self.table)?;
        for field in self.referenced_fields() {
            if self.aliases.iter().any(|a| a == field) {
                continue;
            }
            self.registry.validate_field(&self.table, field)?;
        }

        let mut text = String::from("SELECT ");
        let base_projection = if self.select.is_empty() {
            "*".to_string()
        } else {
            self.select.join(", ")
        };
        text.push_str(&base_projection);
        for computed in &self.computed {
            text.push_str(", ");
            text.push_str(computed);
        }
        text.push_str(" FROM ");
        text.push_str(&self.table);

        if !self.predicates.is_empty() {
            text.push_str(" WHERE ");
            let rendered: Vec<String> = self.predicates.iter().map(render_predicate).collect();
            text.push_str(&rendered.join(" AND "));
        }

        if !self.order.is_empty() {
            text.push_str(" ORDER BY ");
            let rendered: Vec<String> = self
                .order
                .iter()
                .map(|(field, dir)| format!("{field} {}", dir.as_sql()))
                .collect();
            text.push_str(&rendered.join(", "));
        }

        if let Some(offset) = self.start {
            text.push_str(&format!(" START {offset}"));
        }
        if let Some(count) = self.limit {
            text.push_str(&format!(" LIMIT {count}"));
        }

        debug!(table = %self.table, params = self.params.len(), "rendered statement");
        Ok(Statement {
            text,
            params: self.params.into_params(),
        })
    }

    fn referenced_fields(&self) -> impl Iterator<Item = &str> {
        let predicate_fields = self.predicates.iter().filter_map(|p| match p {
            Predicate::Compare { field, .. }
            | Predicate::InList { field, .. }
            | Predicate::Null { field, .. } => Some(field.as_str()),
            Predicate::Raw(_) => None,
        });
        let select_fields = self
            .select
            .iter()
            .map(String::as_str)
            .filter(|f| *f != "*");
        let order_fields = self.order.iter().map(|(f, _)| f.as_str());
        predicate_fields.chain(select_fields).chain(order_fields)
    }

    fn fail(&mut self, err: ValidationError) {
        if self.error.is_none() {
            self.error = Some(QueryError::Validation(err));
        }
    }

    // ------------------------------------------------------------------
    // Hooks for the specialized builders in this crate.
    // ------------------------------------------------------------------

    pub(crate) fn registry(&self) -> &'static ModelRegistry {
        self.registry
    }

    pub(crate) fn table_name(&self) -> &str {
        &self.table
    }

    pub(crate) fn push_param(&mut self, value: impl Into<Value>) -> String {
        self.params.push(value)
    }

    /// Prepend a pre-validated predicate so it renders ahead of ordinary
    /// filters.
    pub(crate) fn raw_predicate_first(&mut self, fragment: String) {
        self.predicates.insert(0, Predicate::Raw(fragment));
    }

    /// Append a computed projection (`expr AS alias`) and register its alias
    /// so `order_by(alias, …)` passes validation without an advisory.
    pub(crate) fn computed_projection(&mut self, expr: String, alias: &str) {
        self.computed.push(expr);
        self.aliases.push(alias.to_string());
    }

    pub(crate) fn has_explicit_order(&self) -> bool {
        !self.order.is_empty()
    }

    pub(crate) fn record_error(&mut self, err: QueryError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}

fn render_predicate(predicate: &Predicate) -> String {
    match predicate {
        Predicate::Compare { field, op, key } => format!("{field} {} ${key}", op.as_sql()),
        Predicate::InList {
            field,
            key,
            negated: false,
        } => format!("{field} IN ${key}"),
        Predicate::InList {
            field,
            key,
            negated: true,
        } => format!("{field} NOT IN ${key}"),
        Predicate::Null {
            field,
            negated: false,
        } => format!("{field} IS NONE"),
        Predicate::Null {
            field,
            negated: true,
        } => format!("{field} IS NOT NONE"),
        Predicate::Raw(fragment) => fragment.clone(),
    }
}

/// Functional entry point mirroring the retrieval layer's `query(table)`.
pub fn query(table: impl Into<String>) -> QueryBuilder {
    QueryBuilder::new(table)
}
