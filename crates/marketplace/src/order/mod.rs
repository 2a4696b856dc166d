//! # Orders
//!
//! An order is written to the buyer's shard after stock has been reserved
//! in the product's shard. There is no transaction spanning the two: if the
//! order write fails, the reservation is released again.

pub mod entity;
pub mod error;

pub use error::*;
