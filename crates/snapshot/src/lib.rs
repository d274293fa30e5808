//! Blockview Snapshot
//!
//! The canonical record of blockchain metrics exchanged between the
//! provider and its pollers, together with the coercion and validation
//! rules both sides apply before accepting one.
//!
//! A [`Snapshot`] can only be obtained through validation, so a consumer
//! never sees a partially valid value:
//!
//! ```rust
//! use blockview_snapshot::Snapshot;
//! use serde_json::json;
//!
//! let snapshot = Snapshot::from_value(&json!({
//!     "block_height": 840000,
//!     "transaction_count": 3,
//!     "recent_transactions": [{"hash": "abc", "fee": 500}, {"hash": "def"}],
//!     "average_fee": 1.2,
//!     "total_volume": 340.5,
//!     "market_price": 65000,
//!     "mempool_size": 9000
//! }))
//! .unwrap();
//!
//! assert_eq!(snapshot.block_height(), 840000);
//! // the element without a fee is dropped
//! assert_eq!(snapshot.recent_transactions().len(), 1);
//! ```

mod error;
mod snapshot;
pub mod validation;

pub use error::{SnapshotError, SnapshotResult};
pub use snapshot::{RecentTransaction, Snapshot, SnapshotParts};
pub use validation::decode_transactions;
