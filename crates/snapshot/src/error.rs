//! Error types for snapshot validation.

use thiserror::Error;

/// Errors that can occur while building a snapshot.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapshotError {
    /// Payload is not JSON at all.
    #[error("snapshot payload is not valid JSON: {message}")]
    InvalidJson {
        /// Parser message.
        message: String,
    },

    /// Payload is not a JSON object.
    #[error("snapshot payload is not an object")]
    NotAnObject,

    /// A required field is absent.
    #[error("missing field `{field}`")]
    MissingField {
        /// Field name.
        field: &'static str,
    },

    /// A field is present but unusable.
    #[error("invalid field `{field}`: {reason}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// Embedded transaction document could not be decoded.
    #[error("transaction list could not be decoded: {message}")]
    Decode {
        /// Error message.
        message: String,
    },
}

impl SnapshotError {
    /// Create an invalid field error.
    pub fn invalid_field<S: Into<String>>(field: &'static str, reason: S) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// Create a decode error.
    pub fn decode<S: Into<String>>(message: S) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

/// Result type for snapshot operations.
pub type SnapshotResult<T> = std::result::Result<T, SnapshotError>;
