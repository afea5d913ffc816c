//! Per-field statistics over an assembled dataset.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::dataset::Dataset;
use super::infer::{is_categorical, value_key, FieldType};

const TOP_VALUES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldProfile {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Rows carrying the key with a non-null value.
    pub non_null: usize,
    /// Rows carrying the key with an explicit null.
    pub null_count: usize,
    /// Rows lacking the key entirely.
    pub missing: usize,
    pub cardinality: usize,
    pub uniqueness: f64,
    pub categorical: bool,
    pub top_values: Vec<ValueCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub total_rows: usize,
    pub num_fields: usize,
    pub fields: Vec<FieldProfile>,
}

pub fn profile_dataset(dataset: &Dataset, threshold: usize) -> DatasetProfile {
    let total = dataset.rows.len();
    let fields = dataset
        .schema
        .fields
        .iter()
        .map(|field| {
            let mut null_count = 0;
            let mut missing = 0;
            let mut freq: HashMap<String, usize> = HashMap::new();

            for row in &dataset.rows {
                match row.get(&field.name) {
                    None => missing += 1,
                    Some(v) if v.is_null() => null_count += 1,
                    Some(v) => *freq.entry(value_key(v)).or_insert(0) += 1,
                }
            }

            let non_null: usize = freq.values().sum();
            let cardinality = freq.len();

            let mut top: Vec<(String, usize)> = freq.into_iter().collect();
            // Ties broken by value so output is stable.
            top.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            top.truncate(TOP_VALUES);

            FieldProfile {
                name: field.name.clone(),
                field_type: field.field_type,
                non_null,
                null_count,
                missing,
                cardinality,
                uniqueness: if non_null > 0 {
                    cardinality as f64 / non_null as f64
                } else {
                    0.0
                },
                categorical: is_categorical(field.field_type, cardinality, threshold),
                top_values: top
                    .into_iter()
                    .map(|(value, count)| ValueCount { value, count })
                    .collect(),
            }
        })
        .collect::<Vec<_>>();

    DatasetProfile {
        total_rows: total,
        num_fields: fields.len(),
        fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::dataset::assemble;
    use crate::algo::document::RawValue;
    use crate::algo::infer::CARDINALITY_THRESHOLD;
    use serde_json::json;

    fn profile(values: Vec<serde_json::Value>) -> DatasetProfile {
        let docs: Vec<RawValue> = values.into_iter().map(RawValue::from_json).collect();
        profile_dataset(&assemble(&docs), CARDINALITY_THRESHOLD)
    }

    #[test]
    fn counts_null_missing_and_present() {
        let p = profile(vec![
            json!({"lang": "rust", "stars": 5}),
            json!({"lang": "go"}),
            json!({"lang": "rust", "stars": null}),
            json!({"lang": null, "stars": 7}),
        ]);
        assert_eq!(p.total_rows, 4);
        let lang = &p.fields[0];
        assert_eq!(lang.name, "lang");
        assert_eq!(lang.non_null, 3);
        assert_eq!(lang.null_count, 1);
        assert_eq!(lang.missing, 0);
        assert_eq!(lang.cardinality, 2);
        assert!(lang.categorical);
        assert_eq!(lang.top_values[0], ValueCount { value: "rust".into(), count: 2 });

        let stars = &p.fields[1];
        assert_eq!(stars.field_type, FieldType::Number);
        assert_eq!(stars.non_null, 2);
        assert_eq!(stars.null_count, 1);
        assert_eq!(stars.missing, 1);
        assert!(!stars.categorical);
    }

    #[test]
    fn uses_schema_union_not_first_row() {
        let p = profile(vec![json!({"a": 1}), json!({"b": "x"})]);
        let names: Vec<&str> = p.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(p.num_fields, 2);
    }

    #[test]
    fn top_values_capped_and_stable() {
        let rows = (0..20).map(|i| json!({"k": format!("v{}", i % 8)})).collect();
        let p = profile(rows);
        let top = &p.fields[0].top_values;
        assert_eq!(top.len(), 5);
        assert_eq!(top[0].value, "v0");
        assert_eq!(top[0].count, 3);
    }

    #[test]
    fn empty_dataset_profile() {
        let p = profile(vec![]);
        assert_eq!(p.total_rows, 0);
        assert!(p.fields.is_empty());
    }
}
