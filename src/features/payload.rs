//! JSON request payload decoding
//!
//! Values are coerced the way a lenient float conversion would: numbers as-is,
//! numeric strings parsed, booleans as 1/0. Anything else is rejected.

use serde_json::{Map, Value};

use crate::features::record::{FeatureRecord, REQUEST_KEYS};
use crate::{GradeError, Result};

/// Decode a single JSON object into a feature record
pub fn parse_record(value: &Value) -> Result<FeatureRecord> {
    let object = value.as_object().ok_or_else(|| {
        GradeError::MalformedPayload(format!("expected a JSON object, got {}", kind(value)))
    })?;
    record_from_object(object)
}

fn record_from_object(object: &Map<String, Value>) -> Result<FeatureRecord> {
    let mut values = [0.0f64; FeatureRecord::DIM];
    for (slot, key) in values.iter_mut().zip(REQUEST_KEYS) {
        let raw = object.get(key).ok_or(GradeError::MissingField { key })?;
        *slot = coerce_f64(key, raw)?;
    }
    Ok(FeatureRecord::from_array(values))
}

/// Convert one payload value to a float
pub fn coerce_f64(key: &'static str, value: &Value) -> Result<f64> {
    let invalid = || GradeError::InvalidField {
        key,
        value: value.to_string(),
    };

    match value {
        Value::Number(n) => n.as_f64().ok_or_else(invalid),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| invalid()),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(invalid()),
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
