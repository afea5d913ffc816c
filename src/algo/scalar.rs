//! Scalar normalization: raw document values to portable JSON values.
//!
//! Lossy conversions, accepted as approximations:
//! - `Decimal128` becomes an `f64`, so digits beyond double precision are lost.
//! - Non-finite doubles (NaN, ±Infinity) have no JSON form and become `null`.
//!
//! 64-bit integers stay exact: `serde_json::Number` holds an `i64` natively.

use chrono::SecondsFormat;
use serde_json::{Map, Number, Value};

use super::document::RawValue;

/// Convert one raw value into a JSON-safe value.
///
/// Total over `RawValue`: every variant has a case, and objects and arrays
/// are normalized all the way down so no wrapper kind survives.
pub fn normalize_scalar(value: &RawValue) -> Value {
    match value {
        RawValue::Null => Value::Null,
        RawValue::Bool(b) => Value::Bool(*b),
        RawValue::Number(n) => Value::Number(n.clone()),
        RawValue::String(s) => Value::String(s.clone()),
        RawValue::ObjectId(id) => Value::String(id.to_string()),
        RawValue::DateTime(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
        RawValue::Decimal128(text) => float_value(text.parse::<f64>().unwrap_or(f64::NAN)),
        RawValue::Int64(i) => Value::Number(Number::from(*i)),
        RawValue::Int32(i) => Value::Number(Number::from(*i)),
        RawValue::Double(f) => float_value(*f),
        RawValue::Array(items) => Value::Array(items.iter().map(normalize_scalar).collect()),
        RawValue::Object(entries) => Value::Object(normalize_entries(entries)),
    }
}

fn normalize_entries(entries: &[(String, RawValue)]) -> Map<String, Value> {
    entries
        .iter()
        .map(|(k, v)| (k.clone(), normalize_scalar(v)))
        .collect()
}

fn float_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}
