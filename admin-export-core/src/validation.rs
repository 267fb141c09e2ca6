//! JSON Schema validation for schema descriptor documents.
//!
//! Descriptors loaded from disk are checked in two passes: structurally
//! against an embedded JSON Schema, then semantically: the schema name,
//! primary key, relation keys and field names must be identifiers, field
//! names must be unique, and the active field must be a declared field.
//! The primary key need not be declared as a field.
//! Field names end up as filter whitelists and XML element names, so a
//! descriptor that fails here is never used.
//!
//! # Example
//! ```rust
//! use admin_export_core::validation::{initialize_descriptor_validator, parse_descriptor};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! initialize_descriptor_validator()?;
//! let schema = parse_descriptor(r#"{
//!     "name": "profile",
//!     "singular": "Profile",
//!     "plural": "Profiles",
//!     "primary": "profile_id",
//!     "fields": [{"name": "profile_id", "sortable": true}]
//! }"#)?;
//! assert_eq!(schema.plural, "Profiles");
//! # Ok(())
//! # }
//! ```

use crate::models::SchemaDescriptor;
use crate::sanitize::is_identifier;
use jsonschema::Validator;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::OnceLock;
use thiserror::Error;

/// Descriptor validation errors with field-level reporting
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Schema compilation failed during initialization
    #[error("JSON Schema compilation failed: {message}")]
    SchemaCompilation { message: String },

    /// Validation failed with specific field errors
    #[error("Descriptor validation failed with {error_count} errors: {errors:?}")]
    ValidationFailed {
        error_count: usize,
        errors: Vec<String>,
    },

    /// JSON parsing error
    #[error("JSON parsing failed: {source}")]
    JsonParsing {
        #[from]
        source: serde_json::Error,
    },
}

/// Embedded JSON Schema for descriptor documents
const DESCRIPTOR_SCHEMA: &str = r#"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "title": "Admin resource descriptor",
  "type": "object",
  "required": ["name", "singular", "plural", "primary"],
  "properties": {
    "name": { "type": "string", "minLength": 1 },
    "singular": { "type": "string", "minLength": 1 },
    "plural": { "type": "string", "minLength": 1 },
    "primary": { "type": "string", "minLength": 1 },
    "active": { "type": ["string", "null"] },
    "fields": {
      "type": "array",
      "items": {
        "type": "object",
        "required": ["name"],
        "properties": {
          "name": { "type": "string", "minLength": 1 },
          "label": { "type": ["string", "null"] },
          "filterable": { "type": "boolean" },
          "sortable": { "type": "boolean" },
          "required": { "type": "boolean" }
        }
      }
    },
    "relations": {
      "type": "array",
      "items": {
        "type": "object",
        "required": ["name", "primary"],
        "properties": {
          "name": { "type": "string", "minLength": 1 },
          "primary": { "type": "string", "minLength": 1 },
          "many": { "type": "integer", "minimum": 0, "maximum": 255 }
        }
      }
    }
  }
}"#;

/// Compiled JSON Schema instance (initialized once)
static COMPILED_SCHEMA: OnceLock<Validator> = OnceLock::new();

/// Initialize and compile the descriptor JSON Schema.
///
/// Safe to call more than once; later calls are no-ops.
///
/// # Errors
/// Returns `ValidationError::SchemaCompilation` if the embedded schema is invalid.
pub fn initialize_descriptor_validator() -> Result<(), ValidationError> {
    if COMPILED_SCHEMA.get().is_some() {
        return Ok(());
    }

    let schema_json: Value =
        serde_json::from_str(DESCRIPTOR_SCHEMA).map_err(|e| ValidationError::SchemaCompilation {
            message: format!("Failed to parse embedded schema: {}", e),
        })?;

    let compiled = jsonschema::validator_for(&schema_json).map_err(|e| {
        ValidationError::SchemaCompilation {
            message: format!("Schema compilation error: {}", e),
        }
    })?;

    let _ = COMPILED_SCHEMA.set(compiled);

    Ok(())
}

/// Validate a descriptor document.
///
/// # Errors
/// Returns every structural or semantic problem found.
pub fn validate_descriptor(json_value: &Value) -> Result<(), ValidationError> {
    initialize_descriptor_validator()?;
    let schema = COMPILED_SCHEMA
        .get()
        .ok_or_else(|| ValidationError::SchemaCompilation {
            message: "Descriptor validator not initialized".to_string(),
        })?;

    if let Err(validation_error) = schema.validate(json_value) {
        let error_message = format!("Descriptor validation failed: {}", validation_error);

        return Err(ValidationError::ValidationFailed {
            error_count: 1,
            errors: vec![error_message],
        });
    }

    let errors = semantic_errors(json_value);
    if !errors.is_empty() {
        return Err(ValidationError::ValidationFailed {
            error_count: errors.len(),
            errors,
        });
    }

    Ok(())
}

/// Checks the rules the JSON Schema cannot express.
fn semantic_errors(json_value: &Value) -> Vec<String> {
    let mut errors = Vec::new();

    let field_names: Vec<&str> = json_value
        .get("fields")
        .and_then(Value::as_array)
        .map(|fields| {
            fields
                .iter()
                .filter_map(|f| f.get("name").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    let mut seen = HashSet::new();
    for name in &field_names {
        if !is_identifier(name) {
            errors.push(format!("Field name '{}' is not a valid identifier", name));
        }
        if !seen.insert(*name) {
            errors.push(format!("Field name '{}' is declared more than once", name));
        }
    }

    if let Some(name) = json_value.get("name").and_then(Value::as_str) {
        if !is_identifier(name) {
            errors.push(format!("Schema name '{}' is not a valid identifier", name));
        }
    }

    if let Some(primary) = json_value.get("primary").and_then(Value::as_str) {
        if !is_identifier(primary) {
            errors.push(format!("Primary key '{}' is not a valid identifier", primary));
        }
    }

    if let Some(active) = json_value.get("active").and_then(Value::as_str) {
        if !seen.contains(active) {
            errors.push(format!("Active field '{}' is not a declared field", active));
        }
    }

    if let Some(relations) = json_value.get("relations").and_then(Value::as_array) {
        for primary in relations
            .iter()
            .filter_map(|r| r.get("primary").and_then(Value::as_str))
        {
            if !is_identifier(primary) {
                errors.push(format!(
                    "Relation primary key '{}' is not a valid identifier",
                    primary
                ));
            }
        }
    }

    errors
}

/// Parse and validate a descriptor document.
///
/// # Errors
/// Returns a parsing error for malformed JSON and a validation error for
/// descriptors that fail either validation pass.
pub fn parse_descriptor(json: &str) -> Result<SchemaDescriptor, ValidationError> {
    let value: Value = serde_json::from_str(json)?;
    validate_descriptor(&value)?;
    Ok(serde_json::from_value(value)?)
}
