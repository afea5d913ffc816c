use nu_plugin::EvaluatedCall;
use nu_protocol::{LabeledError, PipelineData, Record, Span, Value};
use serde_json::{Map, Number, Value as Json};

use crate::algo::document::RawValue;
use crate::config::DatasetConfig;
use crate::ops;

/// Collect any PipelineData into a flat list of documents.
///
/// Handles:
///   - Table (list of records) → each record
///   - Single record → [record]
///   - List of non-records → each value (wrapped later as `{value: v}`)
///   - Empty/Nothing → []
pub fn collect_input(input: PipelineData) -> Vec<Value> {
    match input {
        PipelineData::Value(Value::List { vals, .. }, _) => vals,
        PipelineData::Value(Value::Nothing { .. }, _) | PipelineData::Empty => vec![],
        PipelineData::Value(value, _) => vec![value],
        other => other.into_iter().collect(),
    }
}

/// Convert pipeline values into raw documents, decoding Extended JSON
/// wrappers (`{$oid: ...}`) the same way the CLI does.
pub fn to_documents(values: &[Value]) -> Vec<RawValue> {
    values
        .iter()
        .map(|v| RawValue::from_json(nu_to_json(v)))
        .collect()
}

/// Nushell value → JSON. Dates become `{"$date": "<rfc3339>"}` so they
/// decode as BSON dates; binary becomes lowercase hex.
pub fn nu_to_json(value: &Value) -> Json {
    match value {
        Value::Nothing { .. } => Json::Null,
        Value::Bool { val, .. } => Json::Bool(*val),
        Value::Int { val, .. } => Json::from(*val),
        Value::Float { val, .. } => Number::from_f64(*val).map_or(Json::Null, Json::Number),
        Value::String { val, .. } => Json::String(val.clone()),
        Value::Filesize { val, .. } => Json::from(val.get()),
        Value::Duration { val, .. } => Json::from(*val),
        Value::Date { val, .. } => {
            let mut wrapper = Map::new();
            wrapper.insert("$date".into(), Json::String(val.to_rfc3339()));
            Json::Object(wrapper)
        }
        Value::Binary { val, .. } => {
            Json::String(val.iter().map(|b| format!("{b:02x}")).collect())
        }
        Value::List { vals, .. } => Json::Array(vals.iter().map(nu_to_json).collect()),
        Value::Record { val, .. } => Json::Object(
            val.iter()
                .map(|(k, v)| (k.clone(), nu_to_json(v)))
                .collect(),
        ),
        other => Json::String(
            other
                .coerce_string()
                .unwrap_or_else(|_| format!("{other:?}")),
        ),
    }
}

/// JSON → Nushell value. Integers that fit stay `int`, the rest become `float`.
pub fn json_to_nu(value: &Json, span: Span) -> Value {
    match value {
        Json::Null => Value::nothing(span),
        Json::Bool(b) => Value::bool(*b, span),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::int(i, span),
            None => Value::float(n.as_f64().unwrap_or(f64::NAN), span),
        },
        Json::String(s) => Value::string(s.clone(), span),
        Json::Array(items) => {
            Value::list(items.iter().map(|v| json_to_nu(v, span)).collect(), span)
        }
        Json::Object(map) => {
            let mut record = Record::new();
            for (k, v) in map {
                record.push(k.clone(), json_to_nu(v, span));
            }
            Value::record(record, span)
        }
    }
}

/// Build the settings for one call from `--config`, `--flatten`, and
/// `--threshold`. Flags override the file.
pub fn config_from_call(call: &EvaluatedCall) -> Result<DatasetConfig, LabeledError> {
    let mut config = match call.get_flag::<String>("config")? {
        Some(path) => DatasetConfig::load(&path).map_err(|e| {
            LabeledError::new(e.to_string()).with_label("could not load config", call.head)
        })?,
        None => DatasetConfig::default(),
    };
    if let Some(name) = call.get_flag::<String>("flatten")? {
        config.flatten = ops::parse_flatten_depth(&name)
            .map_err(|e| LabeledError::new(e).with_label("unknown flatten policy", call.head))?;
    }
    if let Some(t) = call.get_flag::<i64>("threshold")? {
        config.cardinality_threshold = threshold_flag(t, call.head)?;
    }
    Ok(config)
}

/// Validate a `--threshold` value.
pub fn threshold_flag(value: i64, head: Span) -> Result<usize, LabeledError> {
    usize::try_from(value).map_err(|_| {
        LabeledError::new("--threshold must not be negative").with_label("negative threshold", head)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn nu_record_converts_to_json_object() {
        let span = Span::test_data();
        let mut inner = Record::new();
        inner.push("age", Value::int(30, span));
        let mut record = Record::new();
        record.push("name", Value::string("ada", span));
        record.push("profile", Value::record(inner, span));
        record.push("tags", Value::list(vec![Value::string("x", span)], span));

        assert_eq!(
            nu_to_json(&Value::record(record, span)),
            json!({"name": "ada", "profile": {"age": 30}, "tags": ["x"]})
        );
    }

    #[test]
    fn nu_date_decodes_as_bson_date() {
        let span = Span::test_data();
        let dt = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let value = Value::date(dt.fixed_offset(), span);
        match RawValue::from_json(nu_to_json(&value)) {
            RawValue::DateTime(got) => assert_eq!(got, dt),
            other => panic!("expected date, got {other:?}"),
        }
    }

    #[test]
    fn nu_binary_becomes_hex() {
        let span = Span::test_data();
        let value = Value::binary(vec![0x0a, 0xff], span);
        assert_eq!(nu_to_json(&value), json!("0aff"));
    }

    #[test]
    fn json_numbers_keep_int_and_float() {
        let span = Span::test_data();
        assert_eq!(json_to_nu(&json!(7), span), Value::int(7, span));
        assert_eq!(json_to_nu(&json!(1.5), span), Value::float(1.5, span));
        assert_eq!(json_to_nu(&json!(null), span), Value::nothing(span));
    }

    #[test]
    fn threshold_flag_rejects_negative() {
        let span = Span::test_data();
        assert_eq!(threshold_flag(12, span).unwrap(), 12);
        assert_eq!(threshold_flag(0, span).unwrap(), 0);
        let err = threshold_flag(-1, span).unwrap_err();
        assert!(err.msg.contains("must not be negative"));
    }

    #[test]
    fn collect_input_handles_shapes() {
        let span = Span::test_data();
        let list = Value::list(vec![Value::int(1, span), Value::int(2, span)], span);
        assert_eq!(collect_input(PipelineData::Value(list, None)).len(), 2);
        assert!(collect_input(PipelineData::Value(Value::nothing(span), None)).is_empty());
        let single = Value::record(Record::new(), span);
        assert_eq!(collect_input(PipelineData::Value(single, None)).len(), 1);
    }
}
