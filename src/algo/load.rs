//! Reading raw document lists from text.

use serde_json::Value;

use super::document::RawValue;
use crate::error::{DatasetError, Result};

/// Parse a document list as JSON records.
///
/// Accepts a JSON array (one document per element), a single JSON value
/// (one document), or newline-delimited JSON. Blank input is zero documents.
pub fn parse_records(text: &str) -> Result<Vec<Value>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(single) => Ok(vec![single]),
        Err(whole_err) => {
            // NDJSON only when the first line is a complete value; otherwise
            // the text was one multi-line document and its own error applies.
            let first_line_parses = trimmed
                .lines()
                .next()
                .is_some_and(|line| serde_json::from_str::<Value>(line).is_ok());
            if !trimmed.contains('\n') || trimmed.starts_with('[') || !first_line_parses {
                return Err(DatasetError::Json(whole_err));
            }
            parse_ndjson(trimmed)
        }
    }
}

/// Parse a document list into raw documents (Extended JSON wrappers decoded).
pub fn parse_documents(text: &str) -> Result<Vec<RawValue>> {
    Ok(parse_records(text)?
        .into_iter()
        .map(RawValue::from_json)
        .collect())
}

fn parse_ndjson(text: &str) -> Result<Vec<Value>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|source| DatasetError::JsonLine {
                line: i + 1,
                source,
            })
        })
        .collect()
}
