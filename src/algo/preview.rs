use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::dataset::Dataset;

/// Tabular view of the first rows of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preview {
    pub columns: Vec<String>,
    /// One cell per column; a row lacking a key shows `null` in that cell.
    pub rows: Vec<Vec<Value>>,
    pub total_rows: usize,
    pub truncated: bool,
}

pub fn preview(dataset: &Dataset, limit: usize) -> Preview {
    let columns: Vec<String> = dataset.schema.names().map(str::to_string).collect();
    let rows = dataset
        .rows
        .iter()
        .take(limit)
        .map(|row| {
            columns
                .iter()
                .map(|c| row.get(c).cloned().unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    Preview {
        columns,
        rows,
        total_rows: dataset.rows.len(),
        truncated: dataset.rows.len() > limit,
    }
}
