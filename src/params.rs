//! # Parameter Normalization
//!
//! Request parameters arrive as an untyped JSON map. Before compilation,
//! every string value is trimmed of surrounding whitespace, recursively
//! through nested arrays and objects. Empty strings and empty lists are
//! treated as "not provided" by the compiler and never produce a
//! predicate.

use serde_json::Value;

/// Untyped request parameters: field name to scalar, list, or range tuple.
pub type ParamMap = serde_json::Map<String, Value>;

/// Recursively trim whitespace from all string values in a parameter map.
pub fn normalize(params: &ParamMap) -> ParamMap {
    params
        .iter()
        .map(|(key, value)| (key.clone(), normalize_value(value)))
        .collect()
}

fn normalize_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.trim().to_string()),
        Value::Array(items) => Value::Array(items.iter().map(normalize_value).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), normalize_value(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// An empty string or empty list counts as "no filter supplied".
pub(crate) fn is_blank(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
