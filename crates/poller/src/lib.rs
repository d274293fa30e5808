//! Blockview Snapshot Poller
//!
//! Client side of the snapshot pipeline. A [`SnapshotPoller`] issues a fetch
//! against a [`SnapshotSource`] on a fixed interval and folds every result
//! into a [`PollState`] that is handed to a single renderer callback.
//!
//! Guarantees:
//!
//! - only the result of the most recently issued fetch is ever applied;
//! - a failed refresh keeps the last good snapshot (stale-but-available);
//! - after [`PollHandle::stop`] returns, the callback is never invoked again;
//! - the callback may call [`PollHandle::stop`] or [`PollHandle::state`] from within.
//!
//! ```rust,no_run
//! use blockview_poller::{render, HttpSnapshotSource, SnapshotPoller};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = HttpSnapshotSource::new("http://127.0.0.1:8080")?;
//! let poller = SnapshotPoller::new(Arc::new(source), Duration::from_secs(45));
//!
//! let handle = poller.start(Duration::from_secs(60), |state| println!("{}", render(state)));
//! tokio::signal::ctrl_c().await?;
//! handle.stop();
//! # Ok(())
//! # }
//! ```

mod error;
mod poller;
mod render;
mod source;
mod state;

pub use error::{PollError, PollResult};
pub use poller::{PollHandle, SnapshotPoller};
pub use render::render;
pub use source::{HttpSnapshotSource, SnapshotSource};
pub use state::{PollState, PollStatus};
