//! # Sellers
//!
//! Sellers register pending and must be approved before listing products.
//! Email, phone, GST number and PAN are each unique across all shards.

pub mod entity;
pub mod error;

pub use error::*;
