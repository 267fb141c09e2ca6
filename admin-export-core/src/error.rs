//! Error types for admin export operations.
//!
//! The export path is lenient: malformed cells and unknown
//! formats degrade instead of failing. The variants below cover the
//! remaining hard failures (missing schema, unreadable uploads, collaborator
//! errors, and writer failures).

use thiserror::Error;

/// Main error type for admin export operations.
#[derive(Debug, Error)]
pub enum AdminExportError {
    /// The requested schema is not known to the schema provider
    #[error("Schema not found: {name}")]
    SchemaNotFound { name: String },

    /// A record collaborator (search or import target) failed
    #[error("Record collaborator failed: {context}")]
    Collaborator {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Writing an export body failed
    #[error("Export rendering failed: {context}")]
    Render { context: String },

    /// An uploaded import payload could not be decoded
    #[error("Import payload rejected: {context}")]
    Import { context: String },

    /// Configuration or validation error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization or deserialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results with AdminExportError
pub type Result<T> = std::result::Result<T, AdminExportError>;

impl AdminExportError {
    /// Creates a schema-not-found error
    pub fn schema_not_found(name: impl Into<String>) -> Self {
        Self::SchemaNotFound { name: name.into() }
    }

    /// Wraps a failure reported by a record source or sink
    pub fn collaborator_failed<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Collaborator {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates a rendering error from any writer failure
    ///
    /// Writer errors from the csv and quick-xml crates differ in type, so
    /// they are captured by their display form.
    pub fn render_failed(format: &str, error: impl std::fmt::Display) -> Self {
        Self::Render {
            context: format!("{} writer: {}", format, error),
        }
    }

    /// Creates an import payload error
    pub fn import_failed(context: impl Into<String>) -> Self {
        Self::Import {
            context: context.into(),
        }
    }

    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a serialization error with context
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }
}
