//! Permissive decoding of transport-encoded values.
//!
//! Records often arrive over a text transport (form posts, query strings)
//! where nested structures cannot be sent as-is. Structured field types
//! therefore accept either native JSON values or strings carrying their JSON
//! encoding. List-like types additionally accept a tolerant comma separated
//! form.
//!
//! The list fallback grammar is part of the observable API:
//!
//! 1. try a strict JSON parse; a JSON array is used as-is
//! 2. otherwise strip one pair of surrounding brackets, if present
//! 3. split the remainder on `,` (no trimming, every piece is a string)
//!
//! ```rust
//! use dynamic_models::coercion::json_or_csv_list;
//! use serde_json::json;
//!
//! assert_eq!(json_or_csv_list(&json!("[\"a\", \"b\"]")).unwrap(), vec![json!("a"), json!("b")]);
//! assert_eq!(json_or_csv_list(&json!("[a,b]")).unwrap(), vec![json!("a"), json!("b")]);
//! assert_eq!(json_or_csv_list(&json!("a")).unwrap(), vec![json!("a")]);
//! ```

use crate::error::{ValidationError, ValidationResult};
use serde_json::Value;

/// Decode a value that may be a JSON-encoded string.
///
/// Non-string values are returned unchanged. Strings must hold valid JSON.
pub fn decode_json(raw: &Value) -> ValidationResult<Value> {
    match raw {
        Value::String(s) => serde_json::from_str(s)
            .map_err(|e| ValidationError::coercion(format!("invalid JSON ({})", e))),
        other => Ok(other.clone()),
    }
}

/// Decode a value into a JSON object, accepting a JSON-encoded string.
pub fn decode_json_object(raw: &Value) -> ValidationResult<serde_json::Map<String, Value>> {
    match decode_json(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(ValidationError::invalid_type("object", value_type(&other))),
    }
}

/// Decode a list with the JSON-then-CSV fallback described in the module docs.
///
/// A string whose strict JSON parse is valid but not an array (for example
/// `"5"`) goes through the CSV path too, so a single bare value becomes a
/// one element list.
pub fn json_or_csv_list(raw: &Value) -> ValidationResult<Vec<Value>> {
    match raw {
        Value::Array(items) => Ok(items.clone()),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => Ok(items),
            _ => Ok(split_csv(s)),
        },
        other => Err(ValidationError::invalid_type("list", value_type(other))),
    }
}

/// Tolerant fallback: strip a single pair of brackets, then split on commas.
fn split_csv(s: &str) -> Vec<Value> {
    let inner = strip_brackets(s);
    inner
        .split(',')
        .map(|piece| Value::String(piece.to_string()))
        .collect()
}

fn strip_brackets(s: &str) -> &str {
    s.strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(s)
}

/// Get the type name of a JSON value for error messages.
pub fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "decimal",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
