//! Error types for orders.

use crate::buyer::BuyerError;
use crate::model::OrderStatus;
use crate::product::ProductError;
use geo_shard::ShardError;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Order validation error: {0}")]
    ValidationError(String),

    #[error("Buyer {0} is blocked")]
    BuyerBlocked(String),

    #[error("Order cannot go from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The buyer could not be resolved.
    #[error(transparent)]
    Buyer(#[from] BuyerError),

    /// Stock reservation or release failed.
    #[error(transparent)]
    Product(#[from] ProductError),

    #[error("Order storage error: {0}")]
    Shard(ShardError),
}

impl From<ShardError> for OrderError {
    fn from(e: ShardError) -> Self {
        match e {
            ShardError::NotFoundAcrossShards { criteria, .. } => OrderError::NotFound(criteria),
            ShardError::NotFound { id, .. } => OrderError::NotFound(id),
            other => OrderError::Shard(other),
        }
    }
}
