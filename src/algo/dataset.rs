//! Dataset assembly: raw documents to `{schema, rows, sampleRows}`.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::document::RawValue;
use super::flatten::{flatten_document, FlattenDepth, NormalizedRow};
use super::infer::{classify_value, union_type, FieldType};
use crate::config::DatasetConfig;

pub const SAMPLE_MIN: usize = 5;
pub const SAMPLE_MAX: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<FieldDescriptor>,
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub schema: Schema,
    pub rows: Vec<NormalizedRow>,
    pub sample_rows: Vec<NormalizedRow>,
}

impl Dataset {
    /// The explicit result for zero input documents.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when there is nothing to show or prompt with.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.schema.fields.is_empty()
    }

    /// Values of one field across all rows that carry the key.
    pub fn column<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows.iter().filter_map(move |row| row.get(name))
    }
}

/// Sample window: `min(max, max(min, rows))`, never more than `rows`.
pub fn sample_len(row_count: usize, min: usize, max: usize) -> usize {
    max.min(min.max(row_count)).min(row_count)
}

/// Build a dataset from raw documents using the default configuration.
pub fn assemble(documents: &[RawValue]) -> Dataset {
    assemble_with(documents, &DatasetConfig::default())
}

/// Build a dataset from raw documents.
///
/// Rows keep input order. The schema is the union of keys over every row in
/// first-seen order, and each field's type unions only the rows that carry
/// it: an absent key is not a null.
pub fn assemble_with(documents: &[RawValue], config: &DatasetConfig) -> Dataset {
    if documents.is_empty() {
        return Dataset::empty();
    }

    let rows: Vec<NormalizedRow> = documents
        .par_iter()
        .map(|doc| flatten_document(doc, config.flatten))
        .collect();

    let schema = infer_schema(&rows);
    let sample = sample_len(rows.len(), config.sample_min, config.sample_max);
    let sample_rows = rows[..sample].to_vec();

    tracing::debug!(
        rows = rows.len(),
        fields = schema.fields.len(),
        sample = sample_rows.len(),
        flatten = config.flatten.as_str(),
        "assembled dataset"
    );

    Dataset {
        schema,
        rows,
        sample_rows,
    }
}

/// Flatten documents without building a schema.
pub fn flatten_all(documents: &[RawValue], depth: FlattenDepth) -> Vec<NormalizedRow> {
    documents
        .par_iter()
        .map(|doc| flatten_document(doc, depth))
        .collect()
}

/// Union field names across rows and infer one type per field.
pub fn infer_schema(rows: &[NormalizedRow]) -> Schema {
    // Per field: the single classification seen so far, or Mixed.
    let mut order: Vec<String> = Vec::new();
    let mut types: HashMap<String, Option<FieldType>> = HashMap::new();

    for row in rows {
        for (key, value) in row {
            let slot = types.entry(key.clone()).or_insert_with(|| {
                order.push(key.clone());
                None
            });
            if let Some(ty) = classify_value(value) {
                *slot = Some(union_type(*slot, ty));
            }
        }
    }

    let fields = order
        .into_iter()
        .map(|name| {
            let field_type = types
                .get(&name)
                .copied()
                .flatten()
                .unwrap_or(FieldType::Null);
            FieldDescriptor { name, field_type }
        })
        .collect();

    Schema { fields }
}
