//! Blockview Snapshot Provider
//!
//! Server side of the snapshot pipeline: reads the most recent persisted
//! record from a [`SnapshotStore`], decodes its embedded transaction list
//! defensively and serves the resulting [`Snapshot`] at `GET /latest_block`.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use blockview_config::{ServerConfig, StoreConfig};
//! use blockview_provider::{ProviderServer, SnapshotProvider, SqliteStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteStore::open(&StoreConfig::default())?;
//! let provider = SnapshotProvider::new(Arc::new(store));
//!
//! let server = ProviderServer::bind(&ServerConfig::default(), provider).await?;
//! server.run(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`Snapshot`]: blockview_snapshot::Snapshot

pub mod error;
pub mod provider;
pub mod server;
pub mod store;

pub use error::{ProviderError, ProviderResult, StoreError, StoreResult};
pub use provider::SnapshotProvider;
pub use server::{router, ProviderServer};
pub use store::{MemoryStore, SnapshotRow, SnapshotStore, SqliteStore};
