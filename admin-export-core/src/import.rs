//! Import payload decoding and result reporting.
//!
//! An uploaded file is decoded into records here, handed to an import
//! collaborator, and the collaborator's per-row validation failures are
//! folded into the JSON envelope the admin screen expects:
//! `{"error": bool, "message": "...", "errors": ["ROW 0 - field: message", ...]}`.
//!
//! Unlike export, import is strict about its input: a malformed payload is
//! an error, because it is user-supplied data about to be written.

use crate::error::AdminExportError;
use crate::models::{Record, SchemaDescriptor};
use crate::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message used when the collaborator rejects rows without saying why
pub const DEFAULT_FAILURE_MESSAGE: &str = "Invalid Parameters";

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportFormat {
    Csv,
    Json,
}

impl ImportFormat {
    /// Detects the format from a filename extension.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(ImportFormat::Csv),
            "json" => Some(ImportFormat::Json),
            _ => None,
        }
    }

    /// Detects the format from a Content-Type header, ignoring parameters.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type.split(';').next()?.trim().to_ascii_lowercase();
        match mime.as_str() {
            "text/csv" | "application/csv" => Some(ImportFormat::Csv),
            "application/json" | "text/json" => Some(ImportFormat::Json),
            _ => None,
        }
    }
}

/// Decodes an uploaded payload into records.
///
/// CSV payloads must have a header row; header names are trimmed and every
/// value is imported as a string. JSON payloads must be an array of
/// objects, or a single object. An empty payload yields no rows.
pub fn parse_import(data: &[u8], format: ImportFormat) -> Result<Vec<Record>> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    match format {
        ImportFormat::Csv => parse_csv(data),
        ImportFormat::Json => parse_json(data),
    }
}

fn parse_csv(data: &[u8]) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AdminExportError::import_failed(format!("Failed to read CSV header: {}", e)))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(AdminExportError::import_failed("CSV header is empty"));
    }

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            AdminExportError::import_failed(format!("CSV row {}: {}", index, e))
        })?;

        let row: Record = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.clone(), Value::String(value.to_string())))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

fn parse_json(data: &[u8]) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_slice(data)
        .map_err(|e| AdminExportError::serialization("JSON import payload", e))?;

    match value {
        Value::Object(row) => Ok(vec![row]),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(row) => Ok(row),
                _ => Err(AdminExportError::import_failed(format!(
                    "JSON item {} is not an object",
                    index
                ))),
            })
            .collect(),
        _ => Err(AdminExportError::import_failed(
            "JSON payload must be an array of objects",
        )),
    }
}

/// Validation failures for one imported row, keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowValidation {
    /// Zero-based position of the row in the payload
    pub row: usize,
    /// Field name to failure message
    pub errors: IndexMap<String, String>,
}

impl RowValidation {
    /// Creates an empty validation entry for `row`.
    pub fn new(row: usize) -> Self {
        Self {
            row,
            errors: IndexMap::new(),
        }
    }

    /// Builder method to record a field failure.
    pub fn with_error(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.errors.insert(field.into(), message.into());
        self
    }
}

/// What the import collaborator reports back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    /// Number of rows written
    pub imported: usize,
    /// Rows that failed validation; empty on success
    pub validation: Vec<RowValidation>,
    /// Optional message accompanying a failure
    pub message: Option<String>,
}

impl ImportOutcome {
    /// Outcome for a fully successful import.
    pub fn imported(count: usize) -> Self {
        Self {
            imported: count,
            ..Self::default()
        }
    }

    /// Outcome for a rejected import.
    pub fn rejected(validation: Vec<RowValidation>) -> Self {
        Self {
            imported: 0,
            validation,
            message: None,
        }
    }

    /// Returns true if any row failed validation.
    pub fn has_errors(&self) -> bool {
        self.validation.iter().any(|v| !v.errors.is_empty())
    }
}

/// The JSON envelope returned to the import screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    /// True when nothing was imported
    pub error: bool,
    /// Summary shown to the user
    pub message: String,
    /// One line per field failure, present on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl ImportReport {
    /// Builds the response envelope for `outcome`.
    ///
    /// Failures list one line per field error, `ROW {row} - {field}: {message}`.
    pub fn from_outcome(schema: &SchemaDescriptor, outcome: &ImportOutcome) -> Self {
        if !outcome.has_errors() {
            return Self {
                error: false,
                message: format!("{} was Imported", schema.plural),
                errors: None,
            };
        }

        let errors = outcome
            .validation
            .iter()
            .flat_map(|v| {
                v.errors
                    .iter()
                    .map(move |(field, message)| format!("ROW {} - {}: {}", v.row, field, message))
            })
            .collect();

        Self {
            error: true,
            message: outcome
                .message
                .clone()
                .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
            errors: Some(errors),
        }
    }

    /// Envelope for a request the caller is not allowed to make.
    pub fn unauthorized() -> Self {
        Self {
            error: true,
            message: "Unauthorized.".to_string(),
            errors: None,
        }
    }

    /// Envelope for a payload that could not be decoded at all.
    pub fn rejected_payload(error: &AdminExportError) -> Self {
        Self {
            error: true,
            message: error.to_string(),
            errors: Some(Vec::new()),
        }
    }
}
