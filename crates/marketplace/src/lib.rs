//! # Marketplace
//!
//! Buyers, sellers, products and orders stored across geo shards.
//!
//! - **[model]**: The records and their request payloads.
//! - **[buyer], [seller], [product], [order]**: How each record is stored
//!   (collection, search and unique fields, validation) and its errors.
//! - **[clients]**: The operations: registration with cross-shard
//!   uniqueness, lookups, admin mutations, listing, order placement.
//! - **[lifecycle]**: [`Marketplace`](lifecycle::Marketplace), which wires
//!   the clients to one set of shards and shuts them down.

pub mod buyer;
pub mod clients;
pub mod lifecycle;
pub mod model;
pub mod order;
pub mod product;
pub mod seller;
pub mod validation;
