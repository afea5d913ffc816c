//! Chart axis candidates derived from an assembled dataset.

use serde::{Deserialize, Serialize};

use super::dataset::Dataset;
use super::infer::{distinct_count, is_categorical, FieldType};

/// A string field rejected as a categorical axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedField {
    pub name: String,
    pub cardinality: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartFields {
    pub categorical: Vec<String>,
    pub numeric: Vec<String>,
    pub temporal: Vec<String>,
    pub excluded: Vec<ExcludedField>,
}

/// Split schema fields into axis candidates.
///
/// Distinct values are counted over every row of the dataset. A string field
/// keeps its inferred type when it is excluded; it is only removed from the
/// categorical candidates.
pub fn select_chart_fields(dataset: &Dataset, threshold: usize) -> ChartFields {
    let mut out = ChartFields::default();
    for field in &dataset.schema.fields {
        match field.field_type {
            FieldType::String => {
                let distinct = distinct_count(dataset.column(&field.name));
                if is_categorical(field.field_type, distinct, threshold) {
                    out.categorical.push(field.name.clone());
                } else {
                    tracing::trace!(
                        field = %field.name,
                        cardinality = distinct,
                        threshold,
                        "string field excluded from categorical axes"
                    );
                    out.excluded.push(ExcludedField {
                        name: field.name.clone(),
                        cardinality: distinct,
                    });
                }
            }
            FieldType::Number => out.numeric.push(field.name.clone()),
            FieldType::Date => out.temporal.push(field.name.clone()),
            _ => {}
        }
    }
    out
}
