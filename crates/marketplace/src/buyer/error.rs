//! Error types for buyers.

use geo_shard::ShardError;
use thiserror::Error;

/// Errors that can occur during buyer operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BuyerError {
    /// No buyer matches the id or email in any shard.
    #[error("Buyer not found: {0}")]
    NotFound(String),

    /// Email or phone is already registered, possibly in another shard.
    #[error("Buyer already exists: {0}")]
    AlreadyExists(String),

    #[error("Buyer validation error: {0}")]
    ValidationError(String),

    /// Sharding layer failure (unreachable shard, timeout, bad query).
    #[error("Buyer storage error: {0}")]
    Shard(ShardError),
}

impl From<ShardError> for BuyerError {
    fn from(e: ShardError) -> Self {
        match e {
            ShardError::DuplicateAcrossShards { field, value, .. } => {
                BuyerError::AlreadyExists(format!("{field} {value}"))
            }
            ShardError::NotFoundAcrossShards { criteria, .. } => BuyerError::NotFound(criteria),
            ShardError::NotFound { id, .. } => BuyerError::NotFound(id),
            other => BuyerError::Shard(other),
        }
    }
}
