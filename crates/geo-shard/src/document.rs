//! Stored records are JSON objects. This module holds the helpers every
//! layer needs to look at them: field access, the natural ordering used for
//! global sorts, and the creation clock.

use serde_json::Value;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{SystemTime, UNIX_EPOCH};

/// A record as the document store sees it.
pub type Document = serde_json::Map<String, Value>;

/// Primary key field of every document.
pub const ID_FIELD: &str = "id";

/// Creation timestamp field (epoch milliseconds).
pub const CREATED_AT_FIELD: &str = "createdAt";

static LAST_TIMESTAMP: AtomicU64 = AtomicU64::new(0);

/// Epoch milliseconds, strictly increasing within the process.
///
/// Two records created back to back never share a `createdAt`, so sorting
/// by creation time is total.
pub fn next_timestamp() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();
    let previous = LAST_TIMESTAMP
        .fetch_update(AtomicOrdering::SeqCst, AtomicOrdering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(now);
    now.max(previous + 1)
}

/// The id of a stored document.
pub fn document_id(doc: &Document) -> Option<&str> {
    doc.get(ID_FIELD).and_then(Value::as_str)
}

/// A field value, treating JSON `null` as absent.
pub fn field<'a>(doc: &'a Document, name: &str) -> Option<&'a Value> {
    doc.get(name).filter(|v| !v.is_null())
}

/// Natural ordering between two present values.
///
/// Numbers compare numerically, strings lexicographically, booleans
/// `false < true`. Values of different kinds order by kind so the sort is
/// still total.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            a.to_string().cmp(&b.to_string())
        }
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

/// Equality used by filters: numerically equal numbers match (`1 == 1.0`).
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare_values(a, b) == Ordering::Equal,
        _ => a == b,
    }
}

fn kind_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
