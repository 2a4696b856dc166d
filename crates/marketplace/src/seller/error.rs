//! Error types for sellers.

use crate::model::SellerStatus;
use geo_shard::ShardError;
use thiserror::Error;

/// Errors that can occur during seller operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SellerError {
    #[error("Seller not found: {0}")]
    NotFound(String),

    /// Email, phone, GST or PAN is already registered.
    #[error("Seller already exists: {0}")]
    AlreadyExists(String),

    #[error("Seller validation error: {0}")]
    ValidationError(String),

    #[error("Seller cannot go from {from} to {to}")]
    InvalidTransition { from: SellerStatus, to: SellerStatus },

    #[error("Seller storage error: {0}")]
    Shard(ShardError),
}

impl From<ShardError> for SellerError {
    fn from(e: ShardError) -> Self {
        match e {
            ShardError::DuplicateAcrossShards { field, value, .. } => {
                SellerError::AlreadyExists(format!("{field} {value}"))
            }
            ShardError::NotFoundAcrossShards { criteria, .. } => SellerError::NotFound(criteria),
            ShardError::NotFound { id, .. } => SellerError::NotFound(id),
            other => SellerError::Shard(other),
        }
    }
}
