//! # Products
//!
//! A product lives in its seller's shard. Stock changes go through guarded
//! updates so a reservation never drives stock below zero.

pub mod entity;
pub mod error;

pub use error::*;
