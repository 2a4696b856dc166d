//! Error types for products.

use geo_shard::ShardError;
use thiserror::Error;

/// Errors that can occur during product operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProductError {
    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("Product validation error: {0}")]
    ValidationError(String),

    /// The owning seller is missing or not approved.
    #[error("Seller {0} cannot list products")]
    SellerNotApproved(String),

    #[error("Insufficient stock for product {product_id}: requested {requested}")]
    InsufficientStock { product_id: String, requested: i64 },

    #[error("Product storage error: {0}")]
    Shard(ShardError),
}

impl From<ShardError> for ProductError {
    fn from(e: ShardError) -> Self {
        match e {
            ShardError::NotFoundAcrossShards { criteria, .. } => ProductError::NotFound(criteria),
            ShardError::NotFound { id, .. } => ProductError::NotFound(id),
            other => ProductError::Shard(other),
        }
    }
}
