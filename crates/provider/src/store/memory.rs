use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::{SnapshotRow, SnapshotStore};
use crate::error::StoreResult;

/// In-memory store keyed by block height.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<BTreeMap<i64, SnapshotRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a row, replacing any row at the same height.
    pub fn insert(&self, row: SnapshotRow) {
        self.rows.write().insert(row.block_height, row);
    }

    pub fn clear(&self) {
        self.rows.write().clear();
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn latest_row(&self) -> StoreResult<Option<SnapshotRow>> {
        Ok(self.rows.read().values().next_back().cloned())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
