//! # Environment Configuration Aggregator
//!
//! Validates the environment once for all divisions and hands each division
//! only the values it declared.
//!
//! ## Steps
//!
//! 1. Union the property names of every declared schema.
//! 2. Pick the ambient values for those names. Unset (and empty) variables
//!    are omitted, never defaulted.
//! 3. Coerce the picked strings towards their declared types, then validate
//!    them against `{ "allOf": [schema, ...] }`. Every violation is reported.
//! 4. Project the validated document onto each division's declared names
//!    and freeze the result.

pub mod coercion;
pub mod source;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use division_types::{DivisionConfig, DivisionError};
use serde_json::{json, Map, Value};
use tracing::{debug, error, info};

pub use source::{DotenvEnvironment, EnvironmentSource};

use crate::validation::SchemaValidator;

/// An environment schema declared by one division.
#[derive(Debug, Clone)]
pub struct DeclaredSchema {
    pub division: String,
    pub schema: Value,
}

impl DeclaredSchema {
    pub fn new(division: impl Into<String>, schema: Value) -> Self {
        Self {
            division: division.into(),
            schema,
        }
    }

    fn properties(&self) -> Option<&Map<String, Value>> {
        self.schema.get("properties").and_then(Value::as_object)
    }

    /// Declared environment variable names.
    pub fn property_names(&self) -> Vec<String> {
        self.properties()
            .map(|properties| properties.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Resolve per-division configuration from `source`.
///
/// The source is only read when at least one division declared a schema.
pub fn resolve_configuration(
    declared: &[DeclaredSchema],
    source: &dyn EnvironmentSource,
    validator: &dyn SchemaValidator,
) -> Result<BTreeMap<String, DivisionConfig>, DivisionError> {
    if declared.is_empty() {
        debug!("[Environment] No division declared an env schema, skipping");
        return Ok(BTreeMap::new());
    }

    let ambient = source.load()?;
    aggregate(declared, &ambient, validator)
}

/// Validate `ambient` against every declared schema and split the result.
pub fn aggregate(
    declared: &[DeclaredSchema],
    ambient: &HashMap<String, String>,
    validator: &dyn SchemaValidator,
) -> Result<BTreeMap<String, DivisionConfig>, DivisionError> {
    let keys: BTreeSet<String> = declared
        .iter()
        .flat_map(DeclaredSchema::property_names)
        .collect();

    let mut input = Map::new();
    for key in &keys {
        match ambient.get(key) {
            Some(value) if !value.is_empty() => {
                input.insert(key.clone(), Value::String(value.clone()));
            }
            _ => {}
        }
    }

    coerce_input(declared, &mut input);

    let composite = json!({
        "allOf": declared.iter().map(|d| d.schema.clone()).collect::<Vec<_>>()
    });
    let document = Value::Object(input);

    if let Err(violations) = validator.validate(&composite, &document) {
        for violation in &violations {
            error!(
                instance_path = %violation.instance_path,
                "[Environment] {}",
                violation.message
            );
        }
        return Err(DivisionError::InvalidEnvironment { violations });
    }

    let mut configs = BTreeMap::new();
    for schema in declared {
        let names = schema.property_names();
        if names.is_empty() {
            continue;
        }

        let projection: BTreeMap<String, Value> = names
            .into_iter()
            .filter_map(|name| document.get(&name).cloned().map(|value| (name, value)))
            .collect();

        debug!(
            "[Environment] {} receives {} of its declared keys",
            schema.division,
            projection.len()
        );
        configs.insert(schema.division.clone(), DivisionConfig::new(projection));
    }

    info!(
        "[Environment] Validated {} keys for {} divisions",
        keys.len(),
        configs.len()
    );
    Ok(configs)
}

/// Coerce values in declaration order, one schema at a time, so a later
/// schema sees what an earlier one produced.
fn coerce_input(declared: &[DeclaredSchema], input: &mut Map<String, Value>) {
    for schema in declared {
        let Some(properties) = schema.properties() else {
            continue;
        };

        for (name, property_schema) in properties {
            let types = coercion::declared_types(property_schema);
            if let Some(value) = input.remove(name) {
                input.insert(name.clone(), coercion::coerce(value, &types));
            }
        }
    }
}
