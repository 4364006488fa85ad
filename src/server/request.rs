//! Turning an untrusted request body into a feature vector.
//!
//! Checks run in a fixed order: parseable and non-empty body, `data` field
//! present, exact element count, then per-element numeric coercion. The first
//! three are client errors; coercion failures surface as scoring errors.

use serde_json::Value;

use crate::inference::classifier::ScoringError;
use crate::server::error::ApiError;

/// Parse a `{"data": [..]}` body into exactly `n_features` floats.
pub fn parse_features(body: &[u8], n_features: usize) -> Result<Vec<f64>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::MalformedRequest);
    }
    let value: Value = serde_json::from_slice(body).map_err(|_| ApiError::MalformedRequest)?;
    if is_falsy(&value) {
        return Err(ApiError::MalformedRequest);
    }

    let data = value
        .as_object()
        .and_then(|obj| obj.get("data"))
        .ok_or(ApiError::MissingField)?;

    // Strings and objects have a length too; a wrong one is reported as such.
    let len = match data {
        Value::Array(items) => Some(items.len()),
        Value::String(s) => Some(s.chars().count()),
        Value::Object(fields) => Some(fields.len()),
        Value::Null | Value::Bool(_) | Value::Number(_) => None,
    };
    if let Some(len) = len {
        if len != n_features {
            return Err(ApiError::InvalidLength {
                expected: n_features,
                got: len,
            });
        }
    }
    let items = match data {
        Value::Array(items) => items,
        other => return Err(ScoringError::NotAnArray(kind(other)).into()),
    };

    let features = items
        .iter()
        .enumerate()
        .map(|(index, item)| coerce(index, item))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(features)
}

/// Numeric coercion: numbers as-is, booleans as 0/1, numeric strings parsed,
/// null as NaN (rejected later by the classifier).
fn coerce(index: usize, item: &Value) -> Result<f64, ScoringError> {
    let not_numeric = || ScoringError::NotNumeric {
        index,
        value: item.to_string(),
    };
    match item {
        Value::Number(n) => n.as_f64().ok_or_else(not_numeric),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| not_numeric()),
        Value::Null => Ok(f64::NAN),
        Value::Array(_) | Value::Object(_) => Err(not_numeric()),
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
