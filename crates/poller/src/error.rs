//! Error types for snapshot fetches.

use thiserror::Error;

/// Why a fetch did not produce a snapshot.
///
/// The renderer treats every variant alike; the distinction is kept for
/// logs and for callers that want it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PollError {
    /// The provider has no data yet.
    #[error("no snapshot available yet")]
    NotFound,

    /// Network failure or provider-side outage.
    #[error("provider unavailable: {message}")]
    Unavailable {
        /// Error message.
        message: String,
    },

    /// The fetch did not finish within its time budget.
    #[error("fetch timed out after {after_ms} ms")]
    Timeout {
        /// Budget in milliseconds.
        after_ms: u64,
    },

    /// The provider answered with something that is not a snapshot.
    #[error("invalid snapshot payload: {message}")]
    InvalidPayload {
        /// Error message.
        message: String,
    },
}

impl PollError {
    /// Create an unavailable error.
    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Create an invalid payload error.
    pub fn invalid_payload<S: Into<String>>(message: S) -> Self {
        Self::InvalidPayload {
            message: message.into(),
        }
    }
}

/// Result type for fetch operations.
pub type PollResult<T> = std::result::Result<T, PollError>;
