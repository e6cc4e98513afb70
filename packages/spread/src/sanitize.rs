//! Last-pass cleanup of JSON payloads before they leave the process.

use serde_json::Value;

/// Recursively replaces every non-finite number with `null`.
///
/// Objects and arrays are walked in place; everything else is returned
/// as-is.
#[must_use]
pub fn sanitize_json(value: Value) -> Value {
    match value {
        Value::Number(n) if n.as_f64().is_some_and(|f| !f.is_finite()) => Value::Null,
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_json).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, sanitize_json(v)))
                .collect(),
        ),
        other => other,
    }
}

/// Serializes `value` and sanitizes the result.
///
/// # Errors
///
/// Returns [`serde_json::Error`] if `value` cannot be represented as JSON.
pub fn to_sanitized_value<T: serde::Serialize + ?Sized>(
    value: &T,
) -> Result<Value, serde_json::Error> {
    serde_json::to_value(value).map(sanitize_json)
}
