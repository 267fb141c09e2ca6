//! Export and search configuration.
//!
//! This module provides the `ExportConfig` struct that controls paging
//! defaults, filename dating, JSON layout and import limits.

use serde::{Deserialize, Serialize};

/// Largest page size the search page accepts.
pub const MAX_SEARCH_RANGE: usize = 1000;

/// Configuration for search, export and import requests.
///
/// # Example
/// ```rust
/// use admin_export_core::config::ExportConfig;
///
/// let config = ExportConfig::new()
///     .with_search_range(25)
///     .with_json_pretty(true);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.search_range, 25);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Page size used by the search page when the request carries none (1-1000)
    pub search_range: usize,
    /// chrono format string for the date part of export filenames
    pub filename_date_format: String,
    /// Pretty-print JSON exports instead of emitting them compactly
    pub json_pretty: bool,
    /// Maximum number of rows accepted in a single import payload
    pub max_import_rows: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            search_range: 50,
            filename_date_format: "%Y-%m-%d".to_string(),
            json_pretty: false,
            max_import_rows: 10_000,
        }
    }
}

impl ExportConfig {
    /// Creates a new config with the stock defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns error if a page size or limit is out of range, or the date
    /// format is empty.
    pub fn validate(&self) -> crate::Result<()> {
        if self.search_range == 0 {
            return Err(crate::error::AdminExportError::configuration(
                "search_range must be greater than 0",
            ));
        }

        if self.search_range > MAX_SEARCH_RANGE {
            return Err(crate::error::AdminExportError::configuration(format!(
                "search_range should not exceed {}",
                MAX_SEARCH_RANGE
            )));
        }

        if self.filename_date_format.trim().is_empty() {
            return Err(crate::error::AdminExportError::configuration(
                "filename_date_format cannot be empty",
            ));
        }

        if self.max_import_rows == 0 {
            return Err(crate::error::AdminExportError::configuration(
                "max_import_rows must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Builder method to set the default search page size.
    pub fn with_search_range(mut self, range: usize) -> Self {
        self.search_range = range;
        self
    }

    /// Builder method to set the filename date format.
    pub fn with_filename_date_format(mut self, format: impl Into<String>) -> Self {
        self.filename_date_format = format.into();
        self
    }

    /// Builder method to enable/disable pretty JSON exports.
    pub fn with_json_pretty(mut self, pretty: bool) -> Self {
        self.json_pretty = pretty;
        self
    }

    /// Builder method to set the import row limit.
    pub fn with_max_import_rows(mut self, max: usize) -> Self {
        self.max_import_rows = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ExportConfig::default();
        assert_eq!(config.search_range, 50);
        assert_eq!(config.filename_date_format, "%Y-%m-%d");
        assert!(!config.json_pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        assert!(ExportConfig::new().with_search_range(0).validate().is_err());
        assert!(
            ExportConfig::new()
                .with_search_range(MAX_SEARCH_RANGE + 1)
                .validate()
                .is_err()
        );
        assert!(
            ExportConfig::new()
                .with_filename_date_format("  ")
                .validate()
                .is_err()
        );
        assert!(ExportConfig::new().with_max_import_rows(0).validate().is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ExportConfig =
            serde_json::from_str(r#"{"json_pretty": true}"#).expect("deserialize");
        assert!(config.json_pretty);
        assert_eq!(config.search_range, 50);
        assert_eq!(config.max_import_rows, 10_000);
    }
}
