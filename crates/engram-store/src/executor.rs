//! Statement execution: parameter binding, deadlines, error classification.

use std::future::IntoFuture;
use std::time::Instant;

use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, warn};

use engram_query::Statement;

use crate::client::Store;
use crate::error::{StoreError, StoreResult};

/// A result row as returned by the store. Always a JSON object; computed
/// columns (`similarity_score`, `relevance_score`, `distance`) appear as
/// plain keys next to the declared fields.
pub type Row = Value;

impl Store {
    /// Execute a builder-produced statement and return its first result set.
    ///
    /// Every parameter key binds through the SDK; the statement text is
    /// final and no value is ever substituted here. Each call races a
    /// per-call deadline; on expiry the in-flight operation is dropped,
    /// which releases its session, and [`StoreError::Timeout`] is returned.
    pub async fn execute(&self, statement: &Statement) -> StoreResult<Vec<Row>> {
        let deadline = self.config().timeout();
        let started = Instant::now();

        let mut query = self.db().query(statement.text.as_str());
        for (key, value) in &statement.params {
            query = query.bind((key.clone(), value.clone()));
        }

        let response = match timeout(deadline, query.into_future()).await {
            Ok(result) => result.map_err(classify)?,
            Err(_) => return Err(StoreError::Timeout(deadline)),
        };
        let mut response = response.check().map_err(classify)?;
        let value: surrealdb::Value = response
            .take(0)
            .map_err(|e| StoreError::Query(format!("result extraction: {e}")))?;
        let rows = rows_from_surreal(&value)?;

        let elapsed = started.elapsed();
        if elapsed > self.config().slow_query_threshold() {
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                text = statement.text.as_str(),
                "slow query"
            );
        } else {
            debug!(
                elapsed_ms = elapsed.as_millis() as u64,
                rows = rows.len(),
                "query executed"
            );
        }
        Ok(rows)
    }
}

/// Convert an SDK result-set value into plain JSON rows.
///
/// Record ids and datetimes in a result set do not deserialize directly
/// into `serde_json::Value`; the SDK serializes them as tagged enum
/// variants such as `{"Thing": {...}}` and `{"Strand": "..."}`. Going
/// through a serialize/deserialize round trip and then stripping the
/// tags yields rows the rest of the crate can treat as ordinary JSON.
fn rows_from_surreal(value: &surrealdb::Value) -> StoreResult<Vec<Row>> {
    let json = serde_json::to_value(value)?;
    let rows = match untag(json) {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    };
    Ok(rows)
}

/// Strip SDK enum tags from a serialized value, recursively.
///
/// `{"Number": {"Int": 30}}` becomes `30`, `{"Strand": "a"}` becomes
/// `"a"`, and `{"Thing": {"tb": "entity", "id": {"String": "e1"}}}`
/// becomes the string `"entity:e1"`. Untagged values pass through so the
/// same path handles result sets the SDK already serialized plainly.
fn untag(value: Value) -> Value {
    let Value::Object(obj) = value else {
        return value;
    };
    // Tag wrappers are always single-key objects; anything wider is a row.
    if obj.len() == 1 {
        if let Some((tag, inner)) = obj.into_iter().next() {
            return match (tag.as_str(), inner) {
                ("Number", Value::Object(mut num)) => num
                    .remove("Int")
                    .or_else(|| num.remove("Float"))
                    .or_else(|| num.remove("Decimal"))
                    .map(untag)
                    .unwrap_or(Value::Object(num)),
                ("Strand" | "String" | "Datetime" | "Uuid", Value::String(s)) => Value::String(s),
                ("Bool", Value::Bool(b)) => Value::Bool(b),
                ("Thing", Value::Object(thing)) => untag_thing(thing),
                ("Array", Value::Array(items)) => {
                    Value::Array(items.into_iter().map(untag).collect())
                }
                ("Object", inner) => untag(inner),
                ("None" | "Null", _) => Value::Null,
                (_, inner) => {
                    let mut rebuilt = serde_json::Map::new();
                    rebuilt.insert(tag, untag(inner));
                    Value::Object(rebuilt)
                }
            };
        }
        return Value::Null;
    }
    Value::Object(obj.into_iter().map(|(k, v)| (k, untag(v))).collect())
}

/// Render a tagged record id as a `table:key` string.
fn untag_thing(mut thing: serde_json::Map<String, Value>) -> Value {
    let tb = thing.remove("tb").and_then(|v| match v {
        Value::String(s) => Some(s),
        _ => None,
    });
    let id = thing.remove("id").map(untag);
    match (tb, id) {
        (Some(tb), Some(Value::String(id))) => Value::String(format!("{tb}:{id}")),
        (Some(tb), Some(Value::Number(id))) => Value::String(format!("{tb}:{id}")),
        _ => Value::Null,
    }
}

/// Map an SDK failure onto the retry taxonomy. The SDK surfaces most
/// storage-level failures as formatted strings, so classification is
/// message-based.
fn classify(err: surrealdb::Error) -> StoreError {
    classify_message(err.to_string())
}

fn classify_message(message: String) -> StoreError {
    let lower = message.to_lowercase();
    if lower.contains("already contains") || lower.contains("unique") {
        StoreError::Constraint(message)
    } else if lower.contains("connection")
        || lower.contains("network")
        || lower.contains("io error")
        || lower.contains("websocket")
    {
        StoreError::Connection(message)
    } else {
        StoreError::Query(message)
    }
}
