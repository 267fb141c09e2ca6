//! Core data structures and services for admin-export.
//!
//! This crate provides the record export, import and key sanitization
//! logic behind schema-driven admin screens. Records come from an injected
//! search collaborator, are flattened to scalar cells, and are rendered as
//! CSV, XML or JSON with a dated attachment filename.
//!
//! # Guarantees
//! - Filter and sort keys are sanitized before any collaborator sees them
//! - A single malformed cell never aborts an export
//! - Unknown export types fall back to JSON
//!
//! # Architecture
//! - Ports (`SchemaProvider`, `RecordSource`, `RecordSink`) abstract storage
//! - `AdminService` orchestrates search, export and import over those ports
//! - Renderers are plain functions over flattened rows

pub mod config;
pub mod error;
pub mod export;
pub mod flatten;
pub mod import;
pub mod logging;
pub mod models;
pub mod ports;
pub mod sanitize;
pub mod service;
pub mod validation;

// Re-export commonly used types
pub use config::ExportConfig;
pub use error::{AdminExportError, Result};
pub use export::{ExportPayload, export_filename, render_export, render_export_dated};
pub use flatten::{flatten_record, flatten_rows, flatten_value};
pub use import::{ImportFormat, ImportOutcome, ImportReport, RowValidation, parse_import};
pub use logging::init_logging;
pub use models::{
    ExportFormat, FieldDescriptor, FilterMap, Record, Relation, SchemaDescriptor, SearchRequest,
    SearchResults, SortMap,
};
pub use ports::{MemoryRecordStore, RecordSink, RecordSource, SchemaProvider, SchemaRegistry};
pub use sanitize::{KeyPolicy, sanitize_filters, sanitize_sort};
pub use service::{AdminService, ExportQuery, SearchPage, SearchQuery};

pub use validation::{
    ValidationError, initialize_descriptor_validator, parse_descriptor, validate_descriptor,
};
