//! Datastore abstraction.
//!
//! The provider needs exactly one read: the most recent row by block height.
//! Schema management and population belong to whatever writes the store.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use blockview_snapshot::{RecentTransaction, SnapshotParts};

use crate::error::StoreResult;

/// One persisted record, as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRow {
    pub block_height: i64,
    pub transaction_count: i64,
    /// Serialized JSON list of `{hash, fee}` entries
    pub recent_transactions: Option<String>,
    pub average_fee: f64,
    pub total_volume: f64,
    pub difficulty: Option<f64>,
    pub hash_rate: Option<f64>,
    pub market_price: f64,
    pub mempool_size: Option<i64>,
}

impl SnapshotRow {
    /// Scalar columns plus an already decoded transaction list.
    pub fn into_parts(self, recent_transactions: Vec<RecentTransaction>) -> SnapshotParts {
        SnapshotParts {
            block_height: self.block_height,
            transaction_count: self.transaction_count,
            recent_transactions,
            average_fee: self.average_fee,
            total_volume: self.total_volume,
            difficulty: self.difficulty,
            hash_rate: self.hash_rate,
            market_price: self.market_price,
            mempool_size: self.mempool_size,
        }
    }
}

/// Read access to persisted snapshots.
///
/// Implementations are shared between concurrent requests and must not hand
/// out exclusive state to a single caller.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Returns the row with the highest block height, if any.
    async fn latest_row(&self) -> StoreResult<Option<SnapshotRow>>;

    /// Short name used in logs.
    fn backend_name(&self) -> &'static str;
}
