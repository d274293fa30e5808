use serde::Serialize;
use serde_json::Value;

use crate::error::{SnapshotError, SnapshotResult};
use crate::validation::{
    optional_float, optional_integer, required_float, required_integer, transactions_from_values,
};

/// One entry of the recent transaction list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentTransaction {
    pub hash: String,
    /// Fee in satoshis
    pub fee: u64,
}

impl RecentTransaction {
    pub fn new<S: Into<String>>(hash: S, fee: u64) -> Self {
        Self {
            hash: hash.into(),
            fee,
        }
    }
}

/// Canonical, immutable record of blockchain metrics.
///
/// Fields are read through accessors; the only ways to build one are
/// [`Snapshot::from_parts`] and [`Snapshot::from_value`], both of which
/// reject negative or non-finite numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    block_height: u64,
    transaction_count: u64,
    recent_transactions: Vec<RecentTransaction>,
    average_fee: f64,
    total_volume: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    difficulty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hash_rate: Option<f64>,
    market_price: f64,
    mempool_size: u64,
}

/// Unvalidated snapshot fields as read from a store row or a payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotParts {
    pub block_height: i64,
    pub transaction_count: i64,
    pub recent_transactions: Vec<RecentTransaction>,
    pub average_fee: f64,
    pub total_volume: f64,
    pub difficulty: Option<f64>,
    pub hash_rate: Option<f64>,
    pub market_price: f64,
    /// Older schema versions omit it; read as zero
    pub mempool_size: Option<i64>,
}

impl Snapshot {
    /// Validates the parts and assembles a snapshot.
    pub fn from_parts(parts: SnapshotParts) -> SnapshotResult<Self> {
        Ok(Self {
            block_height: non_negative_integer("block_height", parts.block_height)?,
            transaction_count: non_negative_integer("transaction_count", parts.transaction_count)?,
            recent_transactions: parts.recent_transactions,
            average_fee: non_negative_float("average_fee", parts.average_fee)?,
            total_volume: non_negative_float("total_volume", parts.total_volume)?,
            difficulty: parts
                .difficulty
                .map(|value| non_negative_float("difficulty", value))
                .transpose()?,
            hash_rate: parts
                .hash_rate
                .map(|value| non_negative_float("hash_rate", value))
                .transpose()?,
            market_price: non_negative_float("market_price", parts.market_price)?,
            mempool_size: non_negative_integer("mempool_size", parts.mempool_size.unwrap_or(0))?,
        })
    }

    /// Coerces a wire payload into a snapshot.
    ///
    /// Numeric fields may arrive as JSON numbers or numeric strings. A
    /// missing or non-array `recent_transactions` reads as an empty list,
    /// and list elements without a usable `hash` or `fee` are dropped.
    pub fn from_value(value: &Value) -> SnapshotResult<Self> {
        let object = value.as_object().ok_or(SnapshotError::NotAnObject)?;

        let recent_transactions = match object.get("recent_transactions") {
            Some(Value::Array(items)) => transactions_from_values(items),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                tracing::debug!(kind = %json_kind(other), "recent_transactions is not an array, using empty list");
                Vec::new()
            }
        };

        Self::from_parts(SnapshotParts {
            block_height: required_integer(object, "block_height")?,
            transaction_count: required_integer(object, "transaction_count")?,
            recent_transactions,
            average_fee: required_float(object, "average_fee")?,
            total_volume: required_float(object, "total_volume")?,
            difficulty: optional_float(object, "difficulty")?,
            hash_rate: optional_float(object, "hash_rate")?,
            market_price: required_float(object, "market_price")?,
            mempool_size: optional_integer(object, "mempool_size")?,
        })
    }

    /// Parses and coerces a raw response body.
    pub fn from_slice(body: &[u8]) -> SnapshotResult<Self> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| SnapshotError::InvalidJson {
                message: e.to_string(),
            })?;
        Self::from_value(&value)
    }

    pub fn block_height(&self) -> u64 {
        self.block_height
    }

    pub fn transaction_count(&self) -> u64 {
        self.transaction_count
    }

    pub fn recent_transactions(&self) -> &[RecentTransaction] {
        &self.recent_transactions
    }

    pub fn average_fee(&self) -> f64 {
        self.average_fee
    }

    pub fn total_volume(&self) -> f64 {
        self.total_volume
    }

    pub fn difficulty(&self) -> Option<f64> {
        self.difficulty
    }

    pub fn hash_rate(&self) -> Option<f64> {
        self.hash_rate
    }

    pub fn market_price(&self) -> f64 {
        self.market_price
    }

    pub fn mempool_size(&self) -> u64 {
        self.mempool_size
    }
}

fn non_negative_integer(field: &'static str, value: i64) -> SnapshotResult<u64> {
    u64::try_from(value).map_err(|_| SnapshotError::invalid_field(field, format!("{value} is negative")))
}

fn non_negative_float(field: &'static str, value: f64) -> SnapshotResult<f64> {
    if !value.is_finite() {
        return Err(SnapshotError::invalid_field(field, "not a finite number"));
    }
    if value < 0.0 {
        return Err(SnapshotError::invalid_field(field, format!("{value} is negative")));
    }
    Ok(value)
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parts() -> SnapshotParts {
        SnapshotParts {
            block_height: 840_000,
            transaction_count: 3,
            recent_transactions: vec![RecentTransaction::new("abc", 500)],
            average_fee: 1.2,
            total_volume: 340.5,
            difficulty: None,
            hash_rate: None,
            market_price: 65_000.0,
            mempool_size: Some(9_000),
        }
    }

    #[test]
    fn test_from_parts_keeps_values() {
        let snapshot = Snapshot::from_parts(parts()).expect("valid");
        assert_eq!(snapshot.block_height(), 840_000);
        assert_eq!(snapshot.transaction_count(), 3);
        assert_eq!(snapshot.average_fee(), 1.2);
        assert_eq!(snapshot.total_volume(), 340.5);
        assert_eq!(snapshot.market_price(), 65_000.0);
        assert_eq!(snapshot.mempool_size(), 9_000);
        assert_eq!(snapshot.recent_transactions(), &[RecentTransaction::new("abc", 500)]);
    }

    #[test]
    fn test_negative_height_rejected() {
        let err = Snapshot::from_parts(SnapshotParts {
            block_height: -1,
            ..parts()
        })
        .expect_err("negative height");
        assert!(matches!(err, SnapshotError::InvalidField { field: "block_height", .. }));
    }

    #[test]
    fn test_nan_fee_rejected() {
        let err = Snapshot::from_parts(SnapshotParts {
            average_fee: f64::NAN,
            ..parts()
        })
        .expect_err("nan");
        assert!(matches!(err, SnapshotError::InvalidField { field: "average_fee", .. }));
    }

    #[test]
    fn test_missing_mempool_defaults_to_zero() {
        let snapshot = Snapshot::from_parts(SnapshotParts {
            mempool_size: None,
            ..parts()
        })
        .expect("valid");
        assert_eq!(snapshot.mempool_size(), 0);
    }

    #[test]
    fn test_serialization_omits_absent_optional_fields() {
        let snapshot = Snapshot::from_parts(parts()).expect("valid");
        let value = serde_json::to_value(&snapshot).expect("serialize");
        assert_eq!(
            value,
            json!({
                "block_height": 840000,
                "transaction_count": 3,
                "recent_transactions": [{"hash": "abc", "fee": 500}],
                "average_fee": 1.2,
                "total_volume": 340.5,
                "market_price": 65000.0,
                "mempool_size": 9000
            })
        );
    }

    #[test]
    fn test_wire_round_trip_preserves_snapshot() {
        let snapshot = Snapshot::from_parts(SnapshotParts {
            difficulty: Some(8.6e13),
            hash_rate: Some(6.1e20),
            ..parts()
        })
        .expect("valid");
        let body = serde_json::to_vec(&snapshot).expect("serialize");
        assert_eq!(Snapshot::from_slice(&body).expect("parse"), snapshot);
    }
}
