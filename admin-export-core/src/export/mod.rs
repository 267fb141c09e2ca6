//! Export rendering for flattened records.
//!
//! Turns a row set into a response body in the requested format together
//! with the metadata a response needs: content type and a dated attachment
//! filename built from the resource's plural name.
//!
//! # Example
//! ```rust
//! use admin_export_core::export::render_export_dated;
//! use admin_export_core::models::{ExportFormat, FieldDescriptor, SchemaDescriptor};
//! use admin_export_core::ExportConfig;
//! use chrono::NaiveDate;
//!
//! let schema = SchemaDescriptor::new("profile", "Profile")
//!     .with_field(FieldDescriptor::new("id"))
//!     .with_field(FieldDescriptor::new("name"));
//! let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap_or_default();
//!
//! let payload = render_export_dated(&[], &schema, ExportFormat::Csv, date, &ExportConfig::default())?;
//! assert_eq!(payload.filename, "Profiles-2024-03-09.csv");
//! assert_eq!(payload.body, b"id,name\n");
//! # Ok::<(), admin_export_core::AdminExportError>(())
//! ```

mod csv_writer;
mod json_writer;
mod xml_writer;

pub use csv_writer::write_csv;
pub use json_writer::write_json;
pub use xml_writer::{ITEM_ELEMENT, element_name, write_xml};

use crate::Result;
use crate::config::ExportConfig;
use crate::models::{ExportFormat, Record, SchemaDescriptor};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io::Write;

const FALLBACK_DATE_FORMAT: &str = "%Y-%m-%d";

/// A rendered export ready to be sent as a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportPayload {
    /// Rendered body, UTF-8
    pub body: Vec<u8>,
    /// Content-Type header value
    pub content_type: String,
    /// Attachment filename, `{plural}-{date}.{ext}`
    pub filename: String,
    /// Format the body was rendered in
    pub format: ExportFormat,
    /// Number of data rows in the body (header rows excluded)
    pub row_count: usize,
}

impl ExportPayload {
    /// Response headers for this payload, in the order they should be sent.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Content-Encoding", "UTF-8".to_string()),
            ("Content-Type", self.content_type.clone()),
            (
                "Content-Disposition",
                format!("attachment; filename={}", self.filename),
            ),
        ]
    }

    /// Body as text. Every renderer emits UTF-8.
    pub fn body_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Builds `{plural}-{date}.{ext}`.
///
/// An unusable date format falls back to `YYYY-MM-DD` instead of failing.
pub fn export_filename(
    plural: &str,
    format: ExportFormat,
    date: NaiveDate,
    date_format: &str,
) -> String {
    let mut stamp = String::new();
    if write!(stamp, "{}", date.format(date_format)).is_err() {
        tracing::warn!(date_format, "Invalid filename date format, using default");
        stamp = date.format(FALLBACK_DATE_FORMAT).to_string();
    }
    format!("{}-{}.{}", plural, stamp, format.extension())
}

/// Writes the body for `format` into `writer`.
///
/// This is the streaming entry point; [`render_export_dated`] buffers the
/// result into an [`ExportPayload`].
pub fn write_export<W: Write>(
    rows: &[Record],
    schema: &SchemaDescriptor,
    format: ExportFormat,
    config: &ExportConfig,
    writer: W,
) -> Result<()> {
    match format {
        ExportFormat::Csv => write_csv(rows, &schema.field_names(), writer),
        ExportFormat::Xml => write_xml(rows, &schema.name, writer),
        ExportFormat::Json => write_json(rows, config.json_pretty, writer),
    }
}

/// Renders rows for a fixed date.
pub fn render_export_dated(
    rows: &[Record],
    schema: &SchemaDescriptor,
    format: ExportFormat,
    date: NaiveDate,
    config: &ExportConfig,
) -> Result<ExportPayload> {
    let mut body = Vec::new();
    write_export(rows, schema, format, config, &mut body)?;

    Ok(ExportPayload {
        body,
        content_type: format.content_type().to_string(),
        filename: export_filename(&schema.plural, format, date, &config.filename_date_format),
        format,
        row_count: rows.len(),
    })
}

/// Renders rows dated today (local time) with the default configuration.
pub fn render_export(
    rows: &[Record],
    schema: &SchemaDescriptor,
    format: ExportFormat,
) -> Result<ExportPayload> {
    render_export_dated(
        rows,
        schema,
        format,
        chrono::Local::now().date_naive(),
        &ExportConfig::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldDescriptor;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap_or_default()
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(
            export_filename("Profiles", ExportFormat::Xml, date(), "%Y-%m-%d"),
            "Profiles-2024-01-15.xml"
        );
        assert_eq!(
            export_filename("Profiles", ExportFormat::Json, date(), "%d%m%Y"),
            "Profiles-15012024.json"
        );
    }

    #[test]
    fn test_export_filename_bad_format_falls_back() {
        assert_eq!(
            export_filename("Profiles", ExportFormat::Csv, date(), "%Q"),
            "Profiles-2024-01-15.csv"
        );
    }

    #[test]
    fn test_payload_headers() {
        let schema = SchemaDescriptor::new("profile", "Profile")
            .with_field(FieldDescriptor::new("profile_id"));
        let payload = render_export_dated(
            &[],
            &schema,
            ExportFormat::Xml,
            date(),
            &ExportConfig::default(),
        )
        .expect("render");

        assert_eq!(payload.row_count, 0);
        assert_eq!(
            payload.headers(),
            vec![
                ("Content-Encoding", "UTF-8".to_string()),
                ("Content-Type", "text/xml; charset=UTF-8".to_string()),
                (
                    "Content-Disposition",
                    "attachment; filename=Profiles-2024-01-15.xml".to_string()
                ),
            ]
        );
        assert!(payload.body_text().contains("<profile></profile>"));
    }
}
