//! Payload coercion tests
//!
//! Payloads in the shape the provider serves, plus the malformed variants a
//! poller must cope with.

use blockview_snapshot::{RecentTransaction, Snapshot, SnapshotError};
use serde_json::json;

#[test]
fn test_full_payload_with_optional_fields() {
    let snapshot = Snapshot::from_value(&json!({
        "block_height": 840000,
        "transaction_count": 3,
        "recent_transactions": [{"hash": "abc", "fee": 500}],
        "average_fee": 1.2,
        "total_volume": 340.5,
        "difficulty": 86388558925171.02,
        "hash_rate": 6.18e20,
        "market_price": 65000,
        "mempool_size": 9000
    }))
    .expect("valid payload");

    assert_eq!(snapshot.block_height(), 840_000);
    assert_eq!(snapshot.difficulty(), Some(86388558925171.02));
    assert_eq!(snapshot.hash_rate(), Some(6.18e20));
    assert_eq!(snapshot.market_price(), 65_000.0);
    assert_eq!(snapshot.recent_transactions(), &[RecentTransaction::new("abc", 500)]);
}

#[test]
fn test_older_schema_without_optional_fields() {
    let snapshot = Snapshot::from_value(&json!({
        "block_height": 1,
        "transaction_count": 0,
        "average_fee": 0,
        "total_volume": 0,
        "market_price": 0
    }))
    .expect("valid payload");

    assert_eq!(snapshot.difficulty(), None);
    assert_eq!(snapshot.hash_rate(), None);
    assert_eq!(snapshot.mempool_size(), 0);
    assert!(snapshot.recent_transactions().is_empty());
}

#[test]
fn test_corrupt_transaction_list_does_not_fail_snapshot() {
    let snapshot = Snapshot::from_value(&json!({
        "block_height": 7,
        "transaction_count": 2,
        "recent_transactions": "{invalid",
        "average_fee": 1.0,
        "total_volume": 2.0,
        "market_price": 3.0,
        "mempool_size": 4
    }))
    .expect("valid payload");

    assert!(snapshot.recent_transactions().is_empty());
    assert_eq!(snapshot.mempool_size(), 4);
}

#[test]
fn test_missing_required_field_fails_whole_snapshot() {
    let err = Snapshot::from_value(&json!({
        "transaction_count": 2,
        "average_fee": 1.0,
        "total_volume": 2.0,
        "market_price": 3.0
    }))
    .expect_err("no height");

    assert_eq!(err, SnapshotError::MissingField { field: "block_height" });
}

#[test]
fn test_error_body_is_not_a_snapshot() {
    let err = Snapshot::from_slice(br#"{"error":"No data found"}"#).expect_err("error body");
    assert!(matches!(err, SnapshotError::MissingField { .. }));

    let err = Snapshot::from_slice(b"<html>").expect_err("not json");
    assert!(matches!(err, SnapshotError::InvalidJson { .. }));

    let err = Snapshot::from_slice(b"[1,2]").expect_err("array");
    assert_eq!(err, SnapshotError::NotAnObject);
}
