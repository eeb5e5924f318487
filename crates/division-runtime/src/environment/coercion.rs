//! Type coercion of raw environment strings.
//!
//! Environment variables are always strings. Before validation each value
//! is coerced towards the `type` its schema declares, following the rules of
//! JSON-Schema validators that support `coerceTypes`:
//!
//! | target    | accepted input                                   |
//! |-----------|--------------------------------------------------|
//! | `boolean` | `"true"`, `"false"`, `1`, `0`, `null`             |
//! | `number`  | numeric strings, booleans, `null`                 |
//! | `integer` | integral numeric strings, booleans, `null`        |
//! | `null`    | `""`, `0`, `false`                                |
//! | `string`  | numbers, booleans, `null`                         |
//!
//! A value that already matches one of the declared types is left alone.
//! A value that cannot be coerced is left alone too, so validation reports
//! it against the original input.

use serde_json::{Number, Value};

/// The types declared by a property schema (`type: "x"` or `type: [..]`).
pub fn declared_types(property_schema: &Value) -> Vec<String> {
    match property_schema.get("type") {
        Some(Value::String(t)) => vec![t.clone()],
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Coerce `value` towards the first of `types` it can be converted to.
pub fn coerce(value: Value, types: &[String]) -> Value {
    if types.is_empty() || types.iter().any(|t| matches_type(&value, t)) {
        return value;
    }

    types
        .iter()
        .find_map(|t| coerce_to(&value, t))
        .unwrap_or(value)
}

fn matches_type(value: &Value, type_name: &str) -> bool {
    match type_name {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => is_integer(value),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        _ => false,
    }
}

fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0),
        _ => false,
    }
}

fn coerce_to(value: &Value, type_name: &str) -> Option<Value> {
    match type_name {
        "string" => match value {
            Value::Number(n) => Some(Value::String(n.to_string())),
            Value::Bool(b) => Some(Value::String(b.to_string())),
            Value::Null => Some(Value::String(String::new())),
            _ => None,
        },
        "number" => match value {
            Value::String(s) => parse_number(s),
            Value::Bool(b) => Some(Value::from(u8::from(*b))),
            Value::Null => Some(Value::from(0)),
            _ => None,
        },
        "integer" => match value {
            Value::String(s) => parse_number(s).filter(is_integer),
            Value::Bool(b) => Some(Value::from(u8::from(*b))),
            Value::Null => Some(Value::from(0)),
            _ => None,
        },
        "boolean" => match value {
            Value::String(s) if s == "true" => Some(Value::Bool(true)),
            Value::String(s) if s == "false" => Some(Value::Bool(false)),
            Value::Number(n) if n.as_f64() == Some(1.0) => Some(Value::Bool(true)),
            Value::Number(n) if n.as_f64() == Some(0.0) => Some(Value::Bool(false)),
            Value::Null => Some(Value::Bool(false)),
            _ => None,
        },
        "null" => match value {
            Value::String(s) if s.is_empty() => Some(Value::Null),
            Value::Number(n) if n.as_f64() == Some(0.0) => Some(Value::Null),
            Value::Bool(false) => Some(Value::Null),
            _ => None,
        },
        _ => None,
    }
}

fn parse_number(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(int) = trimmed.parse::<i64>() {
        return Some(Value::from(int));
    }

    let float = trimmed.parse::<f64>().ok().filter(|f| f.is_finite())?;
    if float.fract() == 0.0 && float.abs() < i64::MAX as f64 {
        return Some(Value::from(float as i64));
    }
    Number::from_f64(float).map(Value::Number)
}
