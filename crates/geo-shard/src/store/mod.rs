//! The stand-in document store: one [`ShardStore`] task per shard, reached
//! through [`Connection`] handles.

mod actor;
mod client;
mod message;

pub use actor::ShardStore;
pub use client::{Connection, ShardLink};
pub use message::{Change, Response, StoreRequest};
