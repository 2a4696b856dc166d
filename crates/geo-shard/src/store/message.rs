//! # Store Messages
//!
//! The five operations a shard's document store understands. A
//! [`Connection`](super::Connection) turns each method call into one of these
//! requests and waits on the oneshot reply.

use crate::document::Document;
use crate::error::ShardError;
use crate::filter::Filter;
use serde_json::Value;
use tokio::sync::oneshot;

/// One-shot reply channel carried by every request.
pub type Response<T> = oneshot::Sender<Result<T, ShardError>>;

/// A single field change applied by an update.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Overwrite the field.
    Set { field: String, value: Value },
    /// Add `by` to an integer field. The field must already hold an integer.
    Increment { field: String, by: i64 },
}

impl Change {
    pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Change::Set {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn increment(field: impl Into<String>, by: i64) -> Self {
        Change::Increment {
            field: field.into(),
            by,
        }
    }
}

/// Requests handled by a [`ShardStore`](super::ShardStore).
///
/// Every request names its collection; a collection springs into existence
/// on first insert.
#[derive(Debug)]
pub enum StoreRequest {
    /// Store a new document. The store assigns `id` and fills `createdAt`
    /// when absent, and replies with the stored document.
    Insert {
        collection: String,
        document: Document,
        respond_to: Response<Document>,
    },
    /// All documents matching the filter, in insertion order.
    Find {
        collection: String,
        filter: Filter,
        respond_to: Response<Vec<Document>>,
    },
    /// Apply `changes` to document `id` if it matches `guard`. Check and
    /// write happen in one step.
    Update {
        collection: String,
        id: String,
        guard: Filter,
        changes: Vec<Change>,
        respond_to: Response<Document>,
    },
    /// Remove document `id`; replies whether it existed.
    Delete {
        collection: String,
        id: String,
        respond_to: Response<bool>,
    },
    Count {
        collection: String,
        filter: Filter,
        respond_to: Response<usize>,
    },
}
