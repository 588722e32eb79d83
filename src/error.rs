//! Error types for streamsink
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for streamsink
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfig { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Encoding Errors (record-scoped)
    // ============================================================================
    #[error(
        "Field name collision: '{original}' and '{existing}' both normalize to '{normalized}'"
    )]
    NameCollision {
        original: String,
        existing: String,
        normalized: String,
    },

    #[error("Schema mismatch for field '{field}': {message}")]
    SchemaMismatch { field: String, message: String },

    #[error("Field '{field}' is not part of the declared schema")]
    UnknownField { field: String },

    // ============================================================================
    // Lifecycle Errors
    // ============================================================================
    #[error("Invalid operation '{operation}' in state {state}")]
    InvalidState { operation: String, state: String },

    #[error("Writer for stream '{stream}' is already closed")]
    AlreadyClosed { stream: String },

    // ============================================================================
    // Arrow/Parquet Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    // ============================================================================
    // Sink / I/O Errors
    // ============================================================================
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sink error: {message}")]
    Sink { message: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create an invalid-config error
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a name collision error
    pub fn name_collision(
        original: impl Into<String>,
        existing: impl Into<String>,
        normalized: impl Into<String>,
    ) -> Self {
        Self::NameCollision {
            original: original.into(),
            existing: existing.into(),
            normalized: normalized.into(),
        }
    }

    /// Create a schema mismatch error
    pub fn schema_mismatch(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an unknown field error
    pub fn unknown_field(field: impl Into<String>) -> Self {
        Self::UnknownField {
            field: field.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(operation: impl Into<String>, state: impl Into<String>) -> Self {
        Self::InvalidState {
            operation: operation.into(),
            state: state.into(),
        }
    }

    /// Create a sink error
    pub fn sink(message: impl Into<String>) -> Self {
        Self::Sink {
            message: message.into(),
        }
    }

    /// Check if this error is scoped to a single record.
    ///
    /// Record-scoped errors leave the writer usable: the caller may skip the
    /// offending record and continue, or abort the whole stream. Everything
    /// else is fatal to the writer instance.
    pub fn is_record_scoped(&self) -> bool {
        matches!(
            self,
            Error::NameCollision { .. } | Error::SchemaMismatch { .. } | Error::UnknownField { .. }
        )
    }
}

/// Result type alias for streamsink
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_config("page_size_bytes", "must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid config value for 'page_size_bytes': must be positive"
        );

        let err = Error::name_collision("a.b", "a-b", "a_b");
        assert_eq!(
            err.to_string(),
            "Field name collision: 'a.b' and 'a-b' both normalize to 'a_b'"
        );

        let err = Error::unknown_field("extra");
        assert_eq!(
            err.to_string(),
            "Field 'extra' is not part of the declared schema"
        );
    }

    #[test]
    fn test_is_record_scoped() {
        assert!(Error::name_collision("a.b", "a-b", "a_b").is_record_scoped());
        assert!(Error::schema_mismatch("age", "expected integer").is_record_scoped());
        assert!(Error::unknown_field("extra").is_record_scoped());

        assert!(!Error::invalid_config("codec", "unsupported").is_record_scoped());
        assert!(!Error::invalid_state("write", "ClosedSuccess").is_record_scoped());
        assert!(!Error::AlreadyClosed {
            stream: "users".to_string()
        }
        .is_record_scoped());
    }
}
