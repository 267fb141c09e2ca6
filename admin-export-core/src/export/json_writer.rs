//! JSON rendering.

use crate::error::AdminExportError;
use crate::models::Record;
use crate::Result;
use std::io::Write;

/// Writes rows as a JSON array of objects, preserving each row's field order.
pub fn write_json<W: Write>(rows: &[Record], pretty: bool, writer: W) -> Result<()> {
    let written = if pretty {
        serde_json::to_writer_pretty(writer, rows)
    } else {
        serde_json::to_writer(writer, rows)
    };

    written.map_err(|e| AdminExportError::serialization("JSON export", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compact_array() {
        let rows = vec![
            json!({"id": 1, "meta": "{\"k\":\"v\"}"})
                .as_object()
                .cloned()
                .unwrap_or_default(),
        ];
        let mut out = Vec::new();
        write_json(&rows, false, &mut out).expect("json render");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            r#"[{"id":1,"meta":"{\"k\":\"v\"}"}]"#
        );
    }

    #[test]
    fn test_empty_rows() {
        let mut out = Vec::new();
        write_json(&[], false, &mut out).expect("json render");
        assert_eq!(out, b"[]");
    }

    #[test]
    fn test_pretty_output_parses_back() {
        let rows = vec![json!({"b": 1, "a": 2}).as_object().cloned().unwrap_or_default()];
        let mut out = Vec::new();
        write_json(&rows, true, &mut out).expect("json render");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains('\n'));
        let parsed: Vec<Record> = serde_json::from_str(&text).expect("parse");
        assert_eq!(parsed, rows);
        assert_eq!(parsed[0].keys().collect::<Vec<_>>(), vec!["b", "a"]);
    }
}
