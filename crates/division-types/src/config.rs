//! Resolved per-division configuration.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

/// Environment values a division declared, validated and coerced.
///
/// Frozen on creation: there is no mutable accessor, and clones share the
/// same underlying map.
#[derive(Debug, Clone, PartialEq)]
pub struct DivisionConfig(Arc<BTreeMap<String, Value>>);

impl DivisionConfig {
    #[must_use]
    pub fn new(values: BTreeMap<String, Value>) -> Self {
        Self(Arc::new(values))
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// A string value. Coerced non-string values return `None`.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    #[must_use]
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
