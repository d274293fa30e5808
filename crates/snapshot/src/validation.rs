//! Field coercion and transaction list decoding.
//!
//! Numbers are accepted either as JSON numbers or as numeric strings, since
//! some datastores hand every column back as text. Integer fields also
//! accept floats with no fractional part.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{SnapshotError, SnapshotResult};
use crate::snapshot::{json_kind, RecentTransaction};

/// Decodes the serialized transaction sub-document of a store row.
///
/// An absent document, invalid JSON and anything other than an array (or
/// `null`) are reported as [`SnapshotError::Decode`]; callers decide whether
/// to recover. Inside an array, unusable elements are dropped one by one.
pub fn decode_transactions(document: Option<&str>) -> SnapshotResult<Vec<RecentTransaction>> {
    let document = document.ok_or_else(|| SnapshotError::decode("document is absent"))?;
    let value: Value =
        serde_json::from_str(document).map_err(|e| SnapshotError::decode(e.to_string()))?;

    match value {
        Value::Array(items) => Ok(transactions_from_values(&items)),
        Value::Null => Ok(Vec::new()),
        other => Err(SnapshotError::decode(format!(
            "expected an array, found {}",
            json_kind(&other)
        ))),
    }
}

/// Keeps the elements that carry both a `hash` and a `fee`, in source order.
pub fn transactions_from_values(items: &[Value]) -> Vec<RecentTransaction> {
    let transactions: Vec<RecentTransaction> = items.iter().filter_map(transaction_from_value).collect();

    let dropped = items.len() - transactions.len();
    if dropped > 0 {
        debug!(dropped, kept = transactions.len(), "dropped malformed transaction entries");
    }
    transactions
}

fn transaction_from_value(item: &Value) -> Option<RecentTransaction> {
    let object = item.as_object()?;
    let hash = object.get("hash")?.as_str()?;
    if hash.is_empty() {
        return None;
    }
    let fee = coerce_integer(object.get("fee")?)?;
    let fee = u64::try_from(fee).ok()?;
    Some(RecentTransaction::new(hash, fee))
}

pub(crate) fn required_integer(object: &Map<String, Value>, field: &'static str) -> SnapshotResult<i64> {
    optional_integer(object, field)?.ok_or(SnapshotError::MissingField { field })
}

pub(crate) fn optional_integer(
    object: &Map<String, Value>,
    field: &'static str,
) -> SnapshotResult<Option<i64>> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => coerce_integer(value)
            .map(Some)
            .ok_or_else(|| SnapshotError::invalid_field(field, format!("expected an integer, found {value}"))),
    }
}

pub(crate) fn required_float(object: &Map<String, Value>, field: &'static str) -> SnapshotResult<f64> {
    optional_float(object, field)?.ok_or(SnapshotError::MissingField { field })
}

pub(crate) fn optional_float(
    object: &Map<String, Value>,
    field: &'static str,
) -> SnapshotResult<Option<f64>> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => coerce_float(value)
            .map(Some)
            .ok_or_else(|| SnapshotError::invalid_field(field, format!("expected a number, found {value}"))),
    }
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_well_formed_document() {
        let txs = decode_transactions(Some(r#"[{"hash":"abc","fee":500},{"hash":"def","fee":0}]"#))
            .expect("decodes");
        assert_eq!(
            txs,
            vec![RecentTransaction::new("abc", 500), RecentTransaction::new("def", 0)]
        );
    }

    #[test]
    fn test_decode_failures() {
        for document in [None, Some("{invalid"), Some(r#"{"hash":"abc"}"#), Some("42")] {
            let err = decode_transactions(document).expect_err("must fail");
            assert!(matches!(err, SnapshotError::Decode { .. }), "{document:?}");
        }
    }

    #[test]
    fn test_decode_null_document_is_empty() {
        assert!(decode_transactions(Some("null")).expect("null").is_empty());
    }

    #[test]
    fn test_elements_without_hash_or_fee_are_dropped() {
        let items = vec![
            json!({"hash": "a", "fee": 1}),
            json!({"fee": 2}),
            json!({"hash": "c"}),
            json!("not an object"),
            json!({"hash": "", "fee": 5}),
            json!({"hash": "f", "fee": -3}),
            json!({"hash": "g", "fee": "7"}),
            json!({"hash": "h", "fee": 8.0}),
            json!({"hash": "i", "fee": 8.5}),
            json!({"hash": "a", "fee": 1}),
        ];
        let txs = transactions_from_values(&items);
        assert_eq!(
            txs,
            vec![
                RecentTransaction::new("a", 1),
                RecentTransaction::new("g", 7),
                RecentTransaction::new("h", 8),
                RecentTransaction::new("a", 1),
            ]
        );
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let object = json!({"height": "840000", "price": " 65000.5 "});
        let object = object.as_object().expect("object");
        assert_eq!(required_integer(object, "height"), Ok(840_000));
        assert_eq!(required_float(object, "price"), Ok(65_000.5));
    }

    #[test]
    fn test_integral_floats_outside_i64_are_rejected() {
        // 2^63 is the first float past i64::MAX; the float just below it still fits.
        let object = json!({
            "over": 9_223_372_036_854_775_808.0_f64,
            "under": 9_223_372_036_854_774_784.0_f64,
        });
        let object = object.as_object().expect("object");
        assert!(matches!(
            required_integer(object, "over"),
            Err(SnapshotError::InvalidField { field: "over", .. })
        ));
        assert_eq!(required_integer(object, "under"), Ok(9_223_372_036_854_774_784));

        let items = vec![json!({"hash": "x", "fee": 9_223_372_036_854_775_808.0_f64})];
        assert!(transactions_from_values(&items).is_empty());
    }

    #[test]
    fn test_missing_and_invalid_fields() {
        let object = json!({"flag": true, "empty": null});
        let object = object.as_object().expect("object");
        assert_eq!(
            required_float(object, "absent"),
            Err(SnapshotError::MissingField { field: "absent" })
        );
        assert_eq!(optional_float(object, "empty"), Ok(None));
        assert!(matches!(
            optional_integer(object, "flag"),
            Err(SnapshotError::InvalidField { field: "flag", .. })
        ));
    }
}
