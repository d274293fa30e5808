//! Error types for the provider and its datastore.

use blockview_snapshot::SnapshotError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a [`SnapshotStore`](crate::SnapshotStore).
#[derive(Error, Debug)]
pub enum StoreError {
    /// The database file could not be opened.
    #[error("failed to open database {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query failed.
    #[error("query failed: {0}")]
    Query(#[from] rusqlite::Error),

    /// Every pooled connection stayed busy for the whole acquire timeout.
    #[error("no database connection available after {waited_ms} ms")]
    PoolExhausted { waited_ms: u64 },

    /// The pool was shut down.
    #[error("connection pool is closed")]
    PoolClosed,

    /// The newest row holds a value that cannot be read as its column's type.
    #[error("latest row is malformed: {0}")]
    InvalidRow(#[source] SnapshotError),

    /// The blocking worker running the query died.
    #[error("store worker failed: {message}")]
    Worker { message: String },
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors returned by [`SnapshotProvider::get_latest_snapshot`](crate::SnapshotProvider::get_latest_snapshot).
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Nothing has been persisted yet.
    #[error("no snapshot has been persisted yet")]
    NotFound,

    /// Datastore connectivity or query failure.
    #[error("datastore unavailable: {message}")]
    UpstreamUnavailable { message: String },

    /// The latest row carries scalar values no snapshot can hold.
    #[error("latest record is malformed: {0}")]
    InvalidRecord(#[source] SnapshotError),
}

impl ProviderError {
    /// Create an upstream unavailable error.
    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::UpstreamUnavailable {
            message: message.into(),
        }
    }
}

impl From<StoreError> for ProviderError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidRow(source) => Self::InvalidRecord(source),
            other => Self::unavailable(other.to_string()),
        }
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
