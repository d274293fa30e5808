//! # Blockview: periodically refreshed blockchain metrics
//!
//! Blockview shows a viewer the latest blockchain metrics (block height,
//! recent transactions, fees, volume, price, mempool size) read from a
//! datastore that some other job keeps populated.
//!
//! The pipeline has two halves:
//!
//! - [`provider`] reads the newest persisted row, recovers from a malformed
//!   transaction list and serves the result at `GET /latest_block`;
//! - [`poller`] fetches that endpoint on an interval and keeps a view
//!   eventually consistent with it, preferring stale data over a blank one.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blockview::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BlockviewConfig::default();
//!
//!     let store = SqliteStore::open(&config.store)?;
//!     store.ensure_schema().await?;
//!     let server = ProviderServer::bind(&config.server, SnapshotProvider::new(Arc::new(store))).await?;
//!     tokio::spawn(server.run(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     }));
//!
//!     let poller = SnapshotPoller::from_config(&config.poller)?;
//!     let handle = poller.start(config.poller.interval(), |state| println!("{}", render(state)));
//!     tokio::signal::ctrl_c().await?;
//!     handle.stop();
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`blockview_config`] - TOML configuration with defaults
//! - [`blockview_snapshot`] - Canonical snapshot and validation rules
//! - [`blockview_provider`] - SQLite store, normalization and HTTP server
//! - [`blockview_poller`] - Poll state machine, HTTP source and renderer

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub use blockview_config as config;
pub use blockview_poller as poller;
pub use blockview_provider as provider;
pub use blockview_snapshot as snapshot;

/// Common imports
pub mod prelude {
    pub use crate::config::{BlockviewConfig, PollerConfig, ServerConfig, StoreConfig};
    pub use crate::poller::{
        render, HttpSnapshotSource, PollError, PollHandle, PollState, PollStatus, SnapshotPoller,
        SnapshotSource,
    };
    pub use crate::provider::{
        MemoryStore, ProviderError, ProviderServer, SnapshotProvider, SnapshotRow, SnapshotStore,
        SqliteStore,
    };
    pub use crate::snapshot::{RecentTransaction, Snapshot, SnapshotParts};
}

/// Blockview library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
