//! # Shard Errors
//!
//! One error type for the whole sharding layer. Per-shard failures
//! (`Unreachable`, `Timeout`, `StoreClosed`, `StoreDropped`) are absorbed by
//! cross-shard reads and surfaced by writes once the fallback chain is spent.
//! `NotFoundAcrossShards` and `DuplicateAcrossShards` come out of the locator.

use crate::key::ShardKey;

/// Errors that can occur within the sharding layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShardError {
    #[error("Shard {shard} unreachable: {reason}")]
    Unreachable { shard: ShardKey, reason: String },

    #[error("Shard {shard} timed out after {millis}ms")]
    Timeout { shard: ShardKey, millis: u64 },

    #[error("Store for shard {0} closed")]
    StoreClosed(ShardKey),

    #[error("Store for shard {0} dropped response channel")]
    StoreDropped(ShardKey),

    #[error("No {collection} matching {criteria} in any shard")]
    NotFoundAcrossShards { collection: String, criteria: String },

    #[error("{collection} with {field} = {value} already exists in shard {shard}")]
    DuplicateAcrossShards {
        collection: String,
        field: String,
        value: String,
        shard: ShardKey,
    },

    #[error("{collection} {id} not found in shard {shard}")]
    NotFound {
        collection: String,
        id: String,
        shard: ShardKey,
    },

    #[error("Update of {collection} {id} rejected: {reason}")]
    Conflict {
        collection: String,
        id: String,
        reason: String,
    },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Document codec error: {0}")]
    Codec(String),
}

impl ShardError {
    /// True for failures that mean "this shard could not answer".
    pub fn is_shard_failure(&self) -> bool {
        matches!(
            self,
            ShardError::Unreachable { .. }
                | ShardError::Timeout { .. }
                | ShardError::StoreClosed(_)
                | ShardError::StoreDropped(_)
        )
    }

    /// True when the cached connection behind this error can no longer be used.
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, ShardError::StoreClosed(_) | ShardError::StoreDropped(_))
    }
}

impl From<serde_json::Error> for ShardError {
    fn from(e: serde_json::Error) -> Self {
        ShardError::Codec(e.to_string())
    }
}
