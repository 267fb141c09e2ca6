//! Record flattening for tabular export.
//!
//! Collection-typed cells are reduced to a single display string; scalars
//! and null are left alone. Flattening is one level deep: a keyed mapping
//! becomes one JSON blob rather than being expanded further.

use crate::models::Record;
use serde_json::Value;

/// Text form of a value as it appears inside an export cell.
///
/// Strings are used as-is, numbers use their JSON form, `true` is `"1"`,
/// `false` and null are empty, and collections fall back to compact JSON.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => String::new(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => json_text(value),
    }
}

fn json_text(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Cell could not be encoded as JSON, leaving it empty");
        String::new()
    })
}

/// Flattens a single cell value.
pub fn flatten_value(value: &Value) -> Value {
    match value {
        Value::Array(items) if items.is_empty() => Value::String(String::new()),
        Value::Object(map) if map.is_empty() => Value::String(String::new()),
        Value::Array(items) => {
            let joined = items.iter().map(value_text).collect::<Vec<_>>().join(",");
            Value::String(joined)
        }
        Value::Object(_) => Value::String(json_text(value)),
        scalar => scalar.clone(),
    }
}

/// Flattens one record, keeping field order.
pub fn flatten_record(record: &Record) -> Record {
    record
        .iter()
        .map(|(key, value)| (key.clone(), flatten_value(value)))
        .collect()
}

/// Flattens every record in a result set.
///
/// # Example
/// ```rust
/// use admin_export_core::flatten::flatten_rows;
/// use serde_json::json;
///
/// let rows = vec![
///     json!({"id": 1, "tags": ["a", "b"], "meta": {"k": "v"}})
///         .as_object()
///         .cloned()
///         .unwrap_or_default(),
/// ];
///
/// let flat = flatten_rows(&rows);
/// assert_eq!(flat[0]["tags"], json!("a,b"));
/// assert_eq!(flat[0]["meta"], json!("{\"k\":\"v\"}"));
/// assert_eq!(flat[0]["id"], json!(1));
/// ```
pub fn flatten_rows(rows: &[Record]) -> Vec<Record> {
    rows.iter().map(flatten_record).collect()
}
