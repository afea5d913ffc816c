//! Text block describing a dataset for inclusion in an LLM request.
//!
//! Only `schema.fields` and `sampleRows` are rendered, which keeps the block
//! bounded no matter how many rows the dataset holds.

use std::fmt::Write;

use serde_json::Value;

use super::dataset::Dataset;

pub fn render_prompt_context(dataset: &Dataset) -> String {
    if dataset.rows.is_empty() {
        return "Dataset: no rows.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Dataset: {} rows, {} fields.",
        dataset.rows.len(),
        dataset.schema.fields.len()
    );
    out.push_str("\nFields:\n");
    for field in &dataset.schema.fields {
        let _ = writeln!(out, "- {} ({})", field.name, field.field_type);
    }

    let _ = writeln!(
        out,
        "\nSample rows ({} of {}):",
        dataset.sample_rows.len(),
        dataset.rows.len()
    );
    for row in &dataset.sample_rows {
        out.push_str(&Value::Object(row.clone()).to_string());
        out.push('\n');
    }
    out
}
