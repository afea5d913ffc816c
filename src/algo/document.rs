//! Raw document model.
//!
//! `RawValue` is the closed set of value kinds an input document may carry,
//! including the BSON wrapper scalars that MongoDB Extended JSON encodes as
//! single-key objects (`{"$oid": ...}`, `{"$date": ...}`, ...).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::{Number, Value};

use crate::error::DatasetError;

/// 12-byte document identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> [u8; 12] {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for ObjectId {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 24 || !s.is_ascii() {
            return Err(DatasetError::InvalidInput(format!(
                "object id must be 24 hex characters, got '{s}'"
            )));
        }
        let mut bytes = [0u8; 12];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|_| {
                DatasetError::InvalidInput(format!("object id contains non-hex characters: '{s}'"))
            })?;
        }
        Ok(Self(bytes))
    }
}

/// One value of a raw input document.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    /// Plain JSON number.
    Number(Number),
    String(String),
    ObjectId(ObjectId),
    DateTime(DateTime<Utc>),
    /// High-precision decimal, kept as its decimal text.
    Decimal128(String),
    Int64(i64),
    Int32(i32),
    Double(f64),
    Array(Vec<RawValue>),
    /// Nested document; entries keep their input order.
    Object(Vec<(String, RawValue)>),
}

impl RawValue {
    /// Decode a JSON value, turning Extended JSON wrappers into their variants.
    ///
    /// Never fails: an object that only looks like a wrapper (extra keys,
    /// malformed payload) stays a plain `Object`.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from_json).collect()),
            Value::Object(map) => {
                if map.len() == 1 {
                    if let Some((key, payload)) = map.iter().next() {
                        if let Some(wrapped) = decode_wrapper(key, payload) {
                            return wrapped;
                        }
                    }
                }
                Self::Object(
                    map.into_iter()
                        .map(|(k, v)| (k, Self::from_json(v)))
                        .collect(),
                )
            }
        }
    }

    pub fn as_object(&self) -> Option<&[(String, RawValue)]> {
        match self {
            Self::Object(entries) => Some(entries),
            _ => None,
        }
    }
}

impl From<Value> for RawValue {
    fn from(value: Value) -> Self {
        Self::from_json(value)
    }
}

fn decode_wrapper(key: &str, payload: &Value) -> Option<RawValue> {
    match key {
        "$oid" => payload
            .as_str()
            .and_then(|s| s.parse::<ObjectId>().ok())
            .map(RawValue::ObjectId),
        "$date" => decode_date(payload).map(RawValue::DateTime),
        "$numberDecimal" => payload
            .as_str()
            .filter(|s| s.trim().parse::<f64>().is_ok())
            .map(|s| RawValue::Decimal128(s.trim().to_string())),
        "$numberLong" => payload
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(RawValue::Int64),
        "$numberInt" => payload
            .as_str()
            .and_then(|s| s.parse::<i32>().ok())
            .map(RawValue::Int32),
        "$numberDouble" => payload
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .map(RawValue::Double),
        _ => None,
    }
}

/// `$date` accepts an ISO string (relaxed form), epoch milliseconds as a
/// bare number, or `{"$numberLong": "<ms>"}` (canonical form).
fn decode_date(payload: &Value) -> Option<DateTime<Utc>> {
    match payload {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        Value::Object(map) if map.len() == 1 => map
            .get("$numberLong")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<i64>().ok())
            .and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}
