//! SQLite backed store with a small fixed connection pool.
//!
//! Connections are checked out through a semaphore. A request that cannot
//! get a connection within the acquire timeout fails with
//! [`StoreError::PoolExhausted`] instead of queueing forever.

use async_trait::async_trait;
use blockview_config::{StoreConfig, SNAPSHOT_TABLE};
use blockview_snapshot::{SnapshotError, SnapshotResult};
use parking_lot::Mutex;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OptionalExtension, Row};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use super::{SnapshotRow, SnapshotStore};
use crate::error::{StoreError, StoreResult};

/// Columns that older schema versions do not have.
const OPTIONAL_COLUMNS: [&str; 3] = ["difficulty", "hash_rate", "mempool_size"];

/// Pooled SQLite store
pub struct SqliteStore {
    path: PathBuf,
    idle: Arc<Mutex<Vec<Connection>>>,
    permits: Arc<Semaphore>,
    pool_size: usize,
    acquire_timeout: Duration,
}

impl SqliteStore {
    /// Opens `max_connections` connections to the configured database file.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let pool_size = config.max_connections.max(1);
        let open_error = |source| StoreError::Open {
            path: config.path.clone(),
            source,
        };

        let mut connections = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            let connection = Connection::open(&config.path).map_err(open_error)?;
            connection
                .busy_timeout(config.acquire_timeout())
                .map_err(open_error)?;
            connections.push(connection);
        }

        debug!(
            target: "blockview",
            path = %config.path.display(),
            pool_size,
            "sqlite store opened"
        );

        Ok(Self {
            path: config.path.clone(),
            idle: Arc::new(Mutex::new(connections)),
            permits: Arc::new(Semaphore::new(pool_size)),
            pool_size,
            acquire_timeout: config.acquire_timeout(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Connections not currently checked out.
    pub fn available_connections(&self) -> usize {
        self.permits.available_permits()
    }

    /// Creates the snapshot table when it does not exist yet.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        self.with_connection(|connection| {
            connection.execute_batch(&schema_sql())?;
            Ok(())
        })
        .await
    }

    async fn with_connection<T, F>(&self, operation: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pooled = self.checkout().await?;
        tokio::task::spawn_blocking(move || match pooled.connection.as_ref() {
            Some(connection) => operation(connection),
            None => Err(StoreError::PoolClosed),
        })
        .await
        .map_err(|e| StoreError::Worker {
            message: e.to_string(),
        })?
    }

    async fn checkout(&self) -> StoreResult<PooledConnection> {
        let permit =
            match tokio::time::timeout(self.acquire_timeout, Arc::clone(&self.permits).acquire_owned()).await {
                Ok(Ok(permit)) => permit,
                Ok(Err(_)) => return Err(StoreError::PoolClosed),
                Err(_) => {
                    return Err(StoreError::PoolExhausted {
                        waited_ms: self.acquire_timeout.as_millis() as u64,
                    })
                }
            };

        let connection = self.idle.lock().pop().ok_or(StoreError::PoolClosed)?;
        Ok(PooledConnection {
            connection: Some(connection),
            idle: Arc::clone(&self.idle),
            _permit: permit,
        })
    }
}

#[async_trait]
impl SnapshotStore for SqliteStore {
    async fn latest_row(&self) -> StoreResult<Option<SnapshotRow>> {
        self.with_connection(query_latest).await
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

/// A checked-out connection. Goes back to the idle list before its permit
/// is released, so a permit always finds a connection.
struct PooledConnection {
    connection: Option<Connection>,
    idle: Arc<Mutex<Vec<Connection>>>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            self.idle.lock().push(connection);
        }
    }
}

fn schema_sql() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {SNAPSHOT_TABLE} (
            block_height INTEGER PRIMARY KEY,
            transaction_count INTEGER NOT NULL,
            recent_transactions TEXT,
            average_fee REAL NOT NULL,
            total_volume REAL NOT NULL,
            difficulty REAL,
            hash_rate REAL,
            market_price REAL NOT NULL,
            mempool_size INTEGER
        )"
    )
}

fn query_latest(connection: &Connection) -> StoreResult<Option<SnapshotRow>> {
    let sql = latest_row_sql(&table_columns(connection)?);
    let mut statement = connection.prepare_cached(&sql)?;
    let row = statement.query_row([], read_row).optional()?;
    row.transpose().map_err(StoreError::InvalidRow)
}

fn table_columns(connection: &Connection) -> StoreResult<HashSet<String>> {
    let mut statement = connection.prepare_cached(&format!("PRAGMA table_info({SNAPSHOT_TABLE})"))?;
    let columns = statement
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(columns)
}

fn latest_row_sql(present: &HashSet<String>) -> String {
    let optional = OPTIONAL_COLUMNS
        .iter()
        .map(|column| {
            if present.contains(*column) {
                (*column).to_string()
            } else {
                format!("NULL AS {column}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "SELECT block_height, transaction_count, recent_transactions, \
         average_fee, total_volume, market_price, {optional} \
         FROM {SNAPSHOT_TABLE} ORDER BY block_height DESC LIMIT 1"
    )
}

/// Number of columns selected by [`latest_row_sql`].
const COLUMN_COUNT: usize = 9;

// Cells are taken as they are stored; a cell that does not fit its column is
// a malformed row, not a failed query.
fn read_row(row: &Row<'_>) -> rusqlite::Result<SnapshotResult<SnapshotRow>> {
    let cells = (0..COLUMN_COUNT)
        .map(|index| row.get_ref(index))
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(row_from_cells(&cells))
}

fn row_from_cells(cells: &[ValueRef<'_>]) -> SnapshotResult<SnapshotRow> {
    Ok(SnapshotRow {
        block_height: required(integer_cell("block_height", cells[0])?, "block_height")?,
        transaction_count: required(
            integer_cell("transaction_count", cells[1])?,
            "transaction_count",
        )?,
        recent_transactions: document_text(cells[2]),
        average_fee: required(float_cell("average_fee", cells[3])?, "average_fee")?,
        total_volume: required(float_cell("total_volume", cells[4])?, "total_volume")?,
        market_price: required(float_cell("market_price", cells[5])?, "market_price")?,
        difficulty: float_cell("difficulty", cells[6])?,
        hash_rate: float_cell("hash_rate", cells[7])?,
        mempool_size: integer_cell("mempool_size", cells[8])?,
    })
}

fn required<T>(value: Option<T>, field: &'static str) -> SnapshotResult<T> {
    value.ok_or(SnapshotError::MissingField { field })
}

fn cell_text<'a>(field: &'static str, bytes: &'a [u8]) -> SnapshotResult<&'a str> {
    std::str::from_utf8(bytes)
        .map(str::trim)
        .map_err(|_| SnapshotError::invalid_field(field, "text is not valid UTF-8"))
}

fn integer_cell(field: &'static str, cell: ValueRef<'_>) -> SnapshotResult<Option<i64>> {
    match cell {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(number) => Ok(Some(number)),
        ValueRef::Real(number)
            if number.fract() == 0.0 && number >= i64::MIN as f64 && number < i64::MAX as f64 =>
        {
            Ok(Some(number as i64))
        }
        ValueRef::Text(bytes) => {
            let text = cell_text(field, bytes)?;
            text.parse().map(Some).map_err(|_| {
                SnapshotError::invalid_field(field, format!("expected an integer, found {text:?}"))
            })
        }
        other => Err(SnapshotError::invalid_field(
            field,
            format!("expected an integer, found {}", other.data_type()),
        )),
    }
}

fn float_cell(field: &'static str, cell: ValueRef<'_>) -> SnapshotResult<Option<f64>> {
    match cell {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(number) => Ok(Some(number as f64)),
        ValueRef::Real(number) => Ok(Some(number)),
        ValueRef::Text(bytes) => {
            let text = cell_text(field, bytes)?;
            text.parse().map(Some).map_err(|_| {
                SnapshotError::invalid_field(field, format!("expected a number, found {text:?}"))
            })
        }
        ValueRef::Blob(_) => Err(SnapshotError::invalid_field(
            field,
            "expected a number, found a blob",
        )),
    }
}

// Whatever the column holds is handed to the decoder as text; judging it is
// the decoder's job, not the query's.
fn document_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
        ValueRef::Integer(number) => Some(number.to_string()),
        ValueRef::Real(number) => Some(number.to_string()),
    }
}
