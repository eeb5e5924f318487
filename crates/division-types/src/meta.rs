//! Division metadata.
//!
//! Metadata arrives loosely typed (a JSON document exported by the division
//! or read from its `meta.json`). It is checked against [`meta_schema`]
//! before being converted into [`DivisionMeta`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Typed division metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DivisionMeta {
    /// JSON schema describing the environment variables the division reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_schema: Option<Value>,
    /// Names of divisions whose contributed state this division needs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl DivisionMeta {
    /// Metadata declaring only dependencies.
    pub fn depending_on<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            env_schema: None,
            depends_on: names.into_iter().map(Into::into).collect(),
        }
    }

    /// The declared schema, if it has a `properties` object.
    ///
    /// Schemas without `properties` carry no environment variable names and
    /// take no part in environment aggregation.
    #[must_use]
    pub fn env_schema_with_properties(&self) -> Option<&Value> {
        self.env_schema
            .as_ref()
            .filter(|schema| schema.get("properties").is_some_and(Value::is_object))
    }

    /// Names of the environment variables declared in the schema.
    #[must_use]
    pub fn env_property_names(&self) -> Vec<String> {
        self.env_schema_with_properties()
            .and_then(|schema| schema.get("properties"))
            .and_then(Value::as_object)
            .map(|properties| properties.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Convert into the loose JSON form divisions export.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Schema every division's metadata document must satisfy.
#[must_use]
pub fn meta_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": {
            "envSchema": {
                "type": "object",
                "additionalProperties": true,
                "description": "A JSON schema for the .env configuration."
            },
            "dependsOn": {
                "type": "array",
                "items": { "type": "string" },
                "description": "An array of strings representing dependencies."
            }
        },
        "additionalProperties": false
    })
}
