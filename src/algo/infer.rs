//! Per-field logical type inference over flattened rows.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Distinct-value count at or above which a string field stops being
/// usable as a categorical axis.
pub const CARDINALITY_THRESHOLD: usize = 50;

/// ISO-8601 date-time prefix: `YYYY-MM-DDTHH:`, ASCII digits only.
static DATE_TIME_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
    Null,
    Array,
    Object,
    Mixed,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Null => "null",
            Self::Array => "array",
            Self::Object => "object",
            Self::Mixed => "mixed",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a single value. `None` for null, which carries no type.
pub fn classify_value(value: &Value) -> Option<FieldType> {
    match value {
        Value::Null => None,
        Value::String(s) if DATE_TIME_PREFIX.is_match(s) => Some(FieldType::Date),
        Value::String(_) => Some(FieldType::String),
        Value::Number(_) => Some(FieldType::Number),
        Value::Bool(_) => Some(FieldType::Boolean),
        Value::Array(_) => Some(FieldType::Array),
        Value::Object(_) => Some(FieldType::Object),
    }
}

/// Union the classifications of every observed value of one field.
///
/// Nulls are skipped. All-null (or no values) gives `Null`; a single
/// classification gives that type; anything else gives `Mixed`.
pub fn infer_field_type<'a>(values: impl IntoIterator<Item = &'a Value>) -> FieldType {
    values
        .into_iter()
        .filter_map(classify_value)
        .fold(None, |seen, ty| Some(union_type(seen, ty)))
        .unwrap_or(FieldType::Null)
}

/// One step of the type union: the first classification is kept, a
/// repeat of it is kept, anything else is `Mixed`.
pub fn union_type(seen: Option<FieldType>, next: FieldType) -> FieldType {
    match seen {
        None => next,
        Some(prev) if prev == next => prev,
        Some(_) => FieldType::Mixed,
    }
}

/// Count distinct non-null values, by their JSON text.
pub fn distinct_count<'a>(values: impl IntoIterator<Item = &'a Value>) -> usize {
    values
        .into_iter()
        .filter(|v| !v.is_null())
        .map(value_key)
        .collect::<HashSet<_>>()
        .len()
}

/// String form used for distinct counting and frequency tables.
pub fn value_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Whether a field can serve as a categorical axis.
pub fn is_categorical(field_type: FieldType, distinct: usize, threshold: usize) -> bool {
    field_type == FieldType::String && distinct < threshold
}
