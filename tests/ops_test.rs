use nu_plugin_dataset::algo::cache::DatasetCache;
use nu_plugin_dataset::config::DatasetConfig;
use nu_plugin_dataset::{ops, FlattenDepth};
use serde_json::{json, Value};

fn sample_records() -> Vec<Value> {
    vec![
        json!({"_id": {"$oid": "65a1f0c2e4b0a1b2c3d4e5f6"}, "status": "open", "qty": {"$numberInt": "3"}, "createdAt": {"$date": "2024-01-05T10:00:00Z"}, "customer": {"name": "Ada", "tier": "gold"}}),
        json!({"_id": {"$oid": "65a1f0c2e4b0a1b2c3d4e5f7"}, "status": "closed", "qty": {"$numberLong": "12"}, "createdAt": {"$date": {"$numberLong": "1704448800000"}}, "customer": {"name": "Grace"}}),
        json!({"_id": {"$oid": "65a1f0c2e4b0a1b2c3d4e5f8"}, "status": "open", "qty": 7, "createdAt": {"$date": "2024-02-01T08:30:00.250Z"}, "customer": {"name": "Linus", "tier": "silver"}, "notes": null}),
        json!({"_id": {"$oid": "65a1f0c2e4b0a1b2c3d4e5f9"}, "status": "pending", "qty": {"$numberDecimal": "2.5"}, "createdAt": {"$date": "2024-03-10T12:00:00Z"}, "customer": {}}),
    ]
}

fn field_types(result: &Value) -> Vec<(String, String)> {
    result["schema"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| {
            (
                f["name"].as_str().unwrap().to_string(),
                f["type"].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

#[test]
fn ops_infer_builds_dataset() {
    let result = ops::op_infer(&sample_records(), &DatasetConfig::default());

    let types = field_types(&result);
    let lookup = |name: &str| {
        types
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t.as_str())
            .unwrap_or_else(|| panic!("missing field {name}"))
    };
    assert_eq!(lookup("_id"), "string");
    assert_eq!(lookup("status"), "string");
    assert_eq!(lookup("qty"), "number");
    assert_eq!(lookup("createdAt"), "date");
    assert_eq!(lookup("customer.name"), "string");
    assert_eq!(lookup("customer.tier"), "string");
    assert_eq!(lookup("customer"), "object");
    assert_eq!(lookup("notes"), "null");

    let rows = result["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0]["_id"], "65a1f0c2e4b0a1b2c3d4e5f6");
    assert_eq!(rows[0]["createdAt"], "2024-01-05T10:00:00.000Z");
    assert_eq!(rows[1]["createdAt"], "2024-01-05T10:00:00.000Z");
    assert_eq!(rows[1]["qty"], 12);
    assert_eq!(rows[3]["qty"], 2.5);
    assert_eq!(rows[3]["customer"], json!({}));
    assert!(rows[1].get("customer.tier").is_none());

    assert_eq!(result["sampleRows"].as_array().unwrap().len(), 4);
}

#[test]
fn ops_infer_empty() {
    let result = ops::op_infer(&[], &DatasetConfig::default());
    assert_eq!(result["schema"]["fields"], json!([]));
    assert_eq!(result["rows"], json!([]));
    assert_eq!(result["sampleRows"], json!([]));
}

#[test]
fn ops_infer_cached_hits_on_repeat() {
    let rows = sample_records();
    let config = DatasetConfig::default();
    let mut cache = DatasetCache::new(4);

    let first = ops::op_infer_cached(&mut cache, &rows, &config);
    let second = ops::op_infer_cached(&mut cache, &rows, &config);
    assert_eq!(first, second);
    assert_eq!(cache.len(), 1);

    let deep = DatasetConfig {
        flatten: FlattenDepth::Deep,
        ..DatasetConfig::default()
    };
    ops::op_infer_cached(&mut cache, &rows, &deep);
    assert_eq!(cache.len(), 2, "settings change must miss");
}

#[test]
fn ops_normalize_keeps_structure() {
    let result = ops::op_normalize(&[json!({"a": {"b": {"$numberLong": "9007199254740993"}}})]);
    assert_eq!(result, json!([{"a": {"b": 9007199254740993_i64}}]));
}

#[test]
fn ops_flatten_shallow_and_deep() {
    let rows = vec![json!({"a": {"b": {"c": 1}}, "k": [1, 2]})];

    let shallow = ops::op_flatten(&rows, FlattenDepth::Shallow);
    assert_eq!(shallow, json!([{"a.b": {"c": 1}, "k": [1, 2]}]));

    let deep = ops::op_flatten(&rows, FlattenDepth::Deep);
    assert_eq!(deep, json!([{"a.b.c": 1, "k": [1, 2]}]));
}

#[test]
fn ops_flatten_wraps_non_objects() {
    let result = ops::op_flatten(&[json!(42), json!("x")], FlattenDepth::Shallow);
    assert_eq!(result, json!([{"value": 42}, {"value": "x"}]));
}

#[test]
fn ops_schema_reports_total_rows() {
    let result = ops::op_schema(&sample_records(), &DatasetConfig::default());
    assert_eq!(result["total_rows"], 4);
    assert!(result["schema"]["fields"].as_array().unwrap().len() >= 6);
}

#[test]
fn ops_profile_counts_nulls_and_missing() {
    let result = ops::op_profile(&sample_records(), &DatasetConfig::default());
    assert_eq!(result["total_rows"], 4);

    let fields = result["fields"].as_array().unwrap();
    let status = fields.iter().find(|f| f["name"] == "status").unwrap();
    assert_eq!(status["cardinality"], 3);
    assert_eq!(status["categorical"], true);
    assert_eq!(status["top_values"][0]["value"], "open");
    assert_eq!(status["top_values"][0]["count"], 2);

    let notes = fields.iter().find(|f| f["name"] == "notes").unwrap();
    assert_eq!(notes["null_count"], 1);
    assert_eq!(notes["missing"], 3);
    assert_eq!(notes["non_null"], 0);
}

#[test]
fn ops_preview_limits_rows() {
    let result = ops::op_preview(&sample_records(), &DatasetConfig::default(), Some(2));
    assert_eq!(result["total_rows"], 4);
    assert_eq!(result["truncated"], true);

    let columns = result["columns"].as_array().unwrap();
    let rows = result["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    for row in rows {
        assert_eq!(row.as_array().unwrap().len(), columns.len());
    }
}

#[test]
fn ops_preview_defaults_to_config_rows() {
    let config = DatasetConfig {
        preview_rows: 1,
        ..DatasetConfig::default()
    };
    let result = ops::op_preview(&sample_records(), &config, None);
    assert_eq!(result["rows"].as_array().unwrap().len(), 1);
}

#[test]
fn ops_prompt_lists_fields() {
    let text = ops::op_prompt(&sample_records(), &DatasetConfig::default());
    assert!(text.starts_with("Dataset: 4 rows,"));
    assert!(text.contains("- createdAt (date)"));
    assert!(text.contains("Sample rows (4 of 4):"));
}

#[test]
fn ops_prompt_empty() {
    assert_eq!(
        ops::op_prompt(&[], &DatasetConfig::default()),
        "Dataset: no rows.\n"
    );
}

#[test]
fn ops_chart_fields_splits_axes() {
    let result = ops::op_chart_fields(&sample_records(), &DatasetConfig::default());
    let categorical = result["categorical"].as_array().unwrap();
    assert!(categorical.contains(&json!("status")));
    assert!(result["numeric"].as_array().unwrap().contains(&json!("qty")));
    assert_eq!(result["temporal"], json!(["createdAt"]));
}

#[test]
fn ops_chart_fields_respects_threshold() {
    let config = DatasetConfig {
        cardinality_threshold: 3,
        ..DatasetConfig::default()
    };
    let result = ops::op_chart_fields(&sample_records(), &config);
    let excluded = result["excluded"].as_array().unwrap();
    // 4 distinct ids and 3 distinct statuses are both at or over the cutoff.
    assert!(excluded.iter().any(|e| e["name"] == "_id" && e["cardinality"] == 4));
    assert!(excluded.iter().any(|e| e["name"] == "status"));
}

#[test]
fn ops_parse_flatten_depth() {
    assert_eq!(ops::parse_flatten_depth("shallow"), Ok(FlattenDepth::Shallow));
    assert!(ops::parse_flatten_depth("sideways").is_err());
}
