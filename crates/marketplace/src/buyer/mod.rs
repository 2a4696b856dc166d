//! # Buyers
//!
//! Buyers are placed by country and state at registration. Email and phone
//! are unique across every shard; registration checks all of them through
//! the locator before writing.
//!
//! - [`entity`] - [`ShardEntity`](geo_shard::ShardEntity) implementation for [`Buyer`](crate::model::Buyer)
//! - [`error`] - [`BuyerError`]

pub mod entity;
pub mod error;

pub use error::*;
