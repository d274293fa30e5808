//! Snapshot retrieval and normalization.

use blockview_snapshot::{decode_transactions, Snapshot};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::store::SnapshotStore;

/// Turns the latest persisted row into a [`Snapshot`].
///
/// Holds nothing but a handle to the shared store, so clones are cheap and
/// every call re-reads the store.
#[derive(Clone)]
pub struct SnapshotProvider {
    store: Arc<dyn SnapshotStore>,
}

impl SnapshotProvider {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self { store }
    }

    /// Fetches the most recent record and normalizes it.
    ///
    /// A transaction list that cannot be decoded is replaced by an empty
    /// list; the aggregate metrics are still served.
    pub async fn get_latest_snapshot(&self) -> ProviderResult<Snapshot> {
        let row = self
            .store
            .latest_row()
            .await
            .map_err(|err| {
                warn!(
                    target: "blockview",
                    backend = self.store.backend_name(),
                    error = %err,
                    "failed to read latest snapshot row"
                );
                ProviderError::from(err)
            })?
            .ok_or(ProviderError::NotFound)?;

        let height = row.block_height;
        let recent_transactions = match decode_transactions(row.recent_transactions.as_deref()) {
            Ok(transactions) => transactions,
            Err(err) => {
                warn!(
                    target: "blockview",
                    height,
                    error = %err,
                    "recent transactions unreadable, serving an empty list"
                );
                Vec::new()
            }
        };

        let snapshot = Snapshot::from_parts(row.into_parts(recent_transactions)).map_err(|err| {
            warn!(target: "blockview", height, error = %err, "latest row rejected");
            ProviderError::InvalidRecord(err)
        })?;

        debug!(
            target: "blockview",
            height = snapshot.block_height(),
            transactions = snapshot.recent_transactions().len(),
            "snapshot served"
        );
        Ok(snapshot)
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }
}
