//! Schema validation port and its `jsonschema` adapter.

use division_types::SchemaViolation;
use jsonschema::{Draft, JSONSchema};
use serde_json::Value;

/// Validates a JSON document against a JSON schema.
pub trait SchemaValidator: Send + Sync {
    /// Validate `value` against `schema`, reporting every violation.
    fn validate(&self, schema: &Value, value: &Value) -> Result<(), Vec<SchemaViolation>>;
}

/// Draft-07 validator backed by the `jsonschema` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaValidator;

impl SchemaValidator for JsonSchemaValidator {
    fn validate(&self, schema: &Value, value: &Value) -> Result<(), Vec<SchemaViolation>> {
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(schema)
            .map_err(|error| {
                vec![SchemaViolation {
                    instance_path: String::new(),
                    message: format!("invalid schema: {error}"),
                }]
            })?;

        compiled.validate(value).map_err(|errors| {
            errors
                .map(|error| SchemaViolation {
                    instance_path: error.instance_path.to_string(),
                    message: error.to_string(),
                })
                .collect::<Vec<_>>()
        })
    }
}
