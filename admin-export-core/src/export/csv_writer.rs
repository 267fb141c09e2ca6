//! CSV rendering.

use crate::error::AdminExportError;
use crate::flatten::value_text;
use crate::models::Record;
use crate::Result;
use std::io::Write;

/// Writes rows as CSV.
///
/// The header comes from the keys of the first row. When there are no rows
/// at all, `empty_header` (the schema's full field list) is written instead
/// so an empty export still carries its columns. Values are written in
/// each row's own key order; rows of differing length are allowed.
pub fn write_csv<W: Write>(rows: &[Record], empty_header: &[String], writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer);

    match rows.first() {
        None => csv_writer
            .write_record(empty_header)
            .map_err(|e| AdminExportError::render_failed("csv", e))?,
        Some(first) => csv_writer
            .write_record(first.keys())
            .map_err(|e| AdminExportError::render_failed("csv", e))?,
    }

    for row in rows {
        csv_writer
            .write_record(row.values().map(value_text))
            .map_err(|e| AdminExportError::render_failed("csv", e))?;
    }

    csv_writer
        .flush()
        .map_err(|e| AdminExportError::render_failed("csv", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(rows: &[Record], header: &[&str]) -> String {
        let header: Vec<String> = header.iter().map(|s| s.to_string()).collect();
        let mut out = Vec::new();
        write_csv(rows, &header, &mut out).expect("csv render");
        String::from_utf8(out).expect("utf8")
    }

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_header_from_first_row() {
        let rows = vec![record(json!({"id": 1, "tags": "a,b"}))];
        assert_eq!(render(&rows, &["ignored"]), "id,tags\n1,\"a,b\"\n");
    }

    #[test]
    fn test_empty_rows_write_schema_header() {
        assert_eq!(render(&[], &["id", "name"]), "id,name\n");
    }

    #[test]
    fn test_quoting_rules() {
        let rows = vec![record(json!({
            "quote": "say \"hi\"",
            "newline": "a\nb",
            "plain": "x",
        }))];
        assert_eq!(
            render(&rows, &[]),
            "quote,newline,plain\n\"say \"\"hi\"\"\",\"a\nb\",x\n"
        );
    }

    #[test]
    fn test_scalar_text_forms() {
        let rows = vec![record(json!({"n": null, "t": true, "f": false, "x": 1.5}))];
        assert_eq!(render(&rows, &[]), "n,t,f,x\n,1,,1.5\n");
    }

    #[test]
    fn test_ragged_rows_do_not_fail() {
        let rows = vec![
            record(json!({"a": 1, "b": 2})),
            record(json!({"a": 3})),
        ];
        assert_eq!(render(&rows, &[]), "a,b\n1,2\n3\n");
    }
}
