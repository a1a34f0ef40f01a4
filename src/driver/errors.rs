//! # Driver Errors

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for driver operations
pub type DriverResult<T> = Result<T, DriverError>;

/// Storage driver errors
#[derive(Debug, Error)]
pub enum DriverError {
    /// Empty collection or resource identifier
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Resource or collection directory absent
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Directory creation, file write/rename/remove or listing failed
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// Document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DriverError {
    /// Missing collection identifier
    pub fn missing_collection() -> Self {
        DriverError::Validation("missing collection - no place to save records".to_string())
    }

    /// Missing resource identifier
    pub fn missing_resource() -> Self {
        DriverError::Validation(
            "missing resource - no place to save records (no file name)".to_string(),
        )
    }

    /// Wrap an I/O error with what the driver was doing
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        DriverError::Io {
            context: context.into(),
            source,
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            DriverError::Validation(_) => "FILEDB_VALIDATION_ERROR",
            DriverError::NotFound(_) => "FILEDB_NOT_FOUND",
            DriverError::Io { .. } => "FILEDB_IO_ERROR",
            DriverError::Serialization(_) => "FILEDB_SERIALIZATION_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            DriverError::Validation(_) => 400,
            DriverError::NotFound(_) => 404,
            DriverError::Io { .. } => 500,
            DriverError::Serialization(_) => 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DriverError::NotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, DriverError::Validation(_))
    }
}
