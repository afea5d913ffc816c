//! Flattening of nested documents into single-level rows with dotted keys.
//!
//! Two policies exist and give different field sets on doubly-nested input:
//!
//! - [`FlattenDepth::Shallow`] (default) pulls up only the immediate children
//!   of top-level objects: `{a: {b: {c: 1}}}` becomes `{"a.b": {c: 1}}`.
//! - [`FlattenDepth::Deep`] recurses to the leaves: `{"a.b.c": 1}`.
//!
//! Arrays are never expanded into indexed keys under either policy. Empty
//! nested objects are kept under their own key rather than dropped. When two
//! paths produce the same key the later one wins.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::document::RawValue;
use super::scalar::normalize_scalar;

/// One flattened, normalized row. Keys keep first-insertion order.
pub type NormalizedRow = Map<String, Value>;

/// Key used when a document is not an object.
pub const WRAPPED_VALUE_KEY: &str = "value";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlattenDepth {
    #[default]
    Shallow,
    Deep,
}

impl FlattenDepth {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "shallow" => Some(Self::Shallow),
            "deep" => Some(Self::Deep),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shallow => "shallow",
            Self::Deep => "deep",
        }
    }
}

/// Flatten one document into a row.
///
/// A document that is not an object (a bare scalar or array in the input
/// list) becomes `{"value": <normalized>}`.
pub fn flatten_document(doc: &RawValue, depth: FlattenDepth) -> NormalizedRow {
    let Some(entries) = doc.as_object() else {
        let mut row = NormalizedRow::new();
        row.insert(WRAPPED_VALUE_KEY.into(), normalize_scalar(doc));
        return row;
    };

    let mut row = NormalizedRow::new();
    match depth {
        FlattenDepth::Shallow => flatten_shallow(entries, &mut row),
        FlattenDepth::Deep => flatten_deep("", entries, &mut row),
    }
    row
}

fn flatten_shallow(entries: &[(String, RawValue)], row: &mut NormalizedRow) {
    for (key, value) in entries {
        match value {
            RawValue::Object(children) if !children.is_empty() => {
                for (child_key, child) in children {
                    row.insert(format!("{key}.{child_key}"), normalize_scalar(child));
                }
            }
            RawValue::Object(_) => {
                row.insert(key.clone(), Value::Object(Map::new()));
            }
            other => {
                row.insert(key.clone(), normalize_scalar(other));
            }
        }
    }
}

fn flatten_deep(prefix: &str, entries: &[(String, RawValue)], row: &mut NormalizedRow) {
    for (key, value) in entries {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            RawValue::Object(children) if !children.is_empty() => {
                flatten_deep(&path, children, row);
            }
            RawValue::Object(_) => {
                row.insert(path, Value::Object(Map::new()));
            }
            other => {
                row.insert(path, normalize_scalar(other));
            }
        }
    }
}
