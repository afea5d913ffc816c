//! Shared operation wrappers for all interfaces (CLI, MCP, plugin).
//!
//! Each `op_*` function is a pure, synchronous wrapper around one or more
//! `algo` modules. Input and output are `serde_json::Value`, with no
//! dependency on rmcp, clap, or nu-plugin.

use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;

use crate::algo::{
    cache::DatasetCache,
    chart, dataset,
    dataset::Dataset,
    document::RawValue,
    flatten::{self, FlattenDepth},
    preview, profile, prompt, scalar,
};
use crate::config::DatasetConfig;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Decode JSON records into raw documents.
pub fn to_documents(records: &[Value]) -> Vec<RawValue> {
    records.iter().cloned().map(RawValue::from_json).collect()
}

fn to_json(value: &impl Serialize) -> Value {
    // Only crate types with string keys pass through here.
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn build(records: &[Value], config: &DatasetConfig) -> Dataset {
    dataset::assemble_with(&to_documents(records), config)
}

// ── Operations ───────────────────────────────────────────────────────────────

/// Full `{schema, rows, sampleRows}` dataset.
pub fn op_infer(records: &[Value], config: &DatasetConfig) -> Value {
    to_json(&build(records, config))
}

/// Same as [`op_infer`], served from `cache` when the records and settings
/// were seen before.
pub fn op_infer_cached(cache: &mut DatasetCache, records: &[Value], config: &DatasetConfig) -> Value {
    let (dataset, _hit) = cache.get_or_assemble(records, config);
    to_json(dataset.as_ref())
}

/// Scalar-normalize each record without flattening.
pub fn op_normalize(records: &[Value]) -> Value {
    let out: Vec<Value> = records
        .par_iter()
        .map(|r| scalar::normalize_scalar(&RawValue::from_json(r.clone())))
        .collect();
    Value::Array(out)
}

/// Flatten each record into a single-level row.
pub fn op_flatten(records: &[Value], depth: FlattenDepth) -> Value {
    let rows = dataset::flatten_all(&to_documents(records), depth);
    Value::Array(rows.into_iter().map(Value::Object).collect())
}

/// Schema only, with the row count it was inferred from.
pub fn op_schema(records: &[Value], config: &DatasetConfig) -> Value {
    let ds = build(records, config);
    serde_json::json!({
        "total_rows": ds.rows.len(),
        "schema": to_json(&ds.schema),
    })
}

pub fn op_profile(records: &[Value], config: &DatasetConfig) -> Value {
    let ds = build(records, config);
    to_json(&profile::profile_dataset(&ds, config.cardinality_threshold))
}

/// Tabular preview; `limit` falls back to `config.preview_rows`.
pub fn op_preview(records: &[Value], config: &DatasetConfig, limit: Option<usize>) -> Value {
    let ds = build(records, config);
    to_json(&preview::preview(&ds, limit.unwrap_or(config.preview_rows)))
}

/// Prompt context text. Empty input renders the "no rows" block.
pub fn op_prompt(records: &[Value], config: &DatasetConfig) -> String {
    prompt::render_prompt_context(&build(records, config))
}

pub fn op_chart_fields(records: &[Value], config: &DatasetConfig) -> Value {
    let ds = build(records, config);
    to_json(&chart::select_chart_fields(&ds, config.cardinality_threshold))
}

/// Parse a flatten policy name, listing the valid names on failure.
pub fn parse_flatten_depth(s: &str) -> Result<FlattenDepth, String> {
    flatten::FlattenDepth::from_str(s)
        .ok_or_else(|| format!("Unknown flatten policy '{s}'. Use: shallow, deep"))
}
