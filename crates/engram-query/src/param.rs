//! Parameter accumulation for rendered statements.
//!
//! Every literal value a builder accepts is stored under a fresh synthetic
//! key (`p0`, `p1`, …) and referenced from statement text only as a
//! placeholder. No value is ever concatenated into the text.

use serde_json::Value;
use std::collections::HashMap;

/// A finalized statement: text with `$key` placeholders plus the map that
/// binds them.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub text: String,
    pub params: HashMap<String, Value>,
}

/// Accumulator handing out fresh parameter keys.
#[derive(Debug, Clone, Default)]
pub struct ParamBag {
    prefix: &'static str,
    values: HashMap<String, Value>,
    counter: usize,
}

impl ParamBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bag whose keys carry a prefix, used to keep the graph leg of a
    /// combined query disjoint from the main leg.
    pub fn with_prefix(prefix: &'static str) -> Self {
        Self {
            prefix,
            ..Self::default()
        }
    }

    /// Store a value and return its key (without the `$` sigil).
    pub fn push(&mut self, value: impl Into<Value>) -> String {
        let key = format!("{}p{}", self.prefix, self.counter);
        self.counter += 1;
        self.values.insert(key.clone(), value.into());
        key
    }

    /// Placeholder form of [`push`](Self::push): `$key`.
    pub fn push_placeholder(&mut self, value: impl Into<Value>) -> String {
        format!("${}", self.push(value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_params(self) -> HashMap<String, Value> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_fresh_and_sequential() {
        let mut bag = ParamBag::new();
        assert_eq!(bag.push("a"), "p0");
        assert_eq!(bag.push(1), "p1");
        assert_eq!(bag.push_placeholder(true), "$p2");
        assert_eq!(bag.len(), 3);
    }

    #[test]
    fn prefixed_keys_stay_disjoint() {
        let mut bag = ParamBag::with_prefix("graph_");
        assert_eq!(bag.push("seed"), "graph_p0");
        let params = bag.into_params();
        assert_eq!(params.get("graph_p0"), Some(&json!("seed")));
    }

    #[test]
    fn values_round_trip_unmodified() {
        let mut bag = ParamBag::new();
        bag.push(json!({"k": [1, 2, 3]}));
        let params = bag.into_params();
        assert_eq!(params.get("p0"), Some(&json!({"k": [1, 2, 3]})));
    }
}
