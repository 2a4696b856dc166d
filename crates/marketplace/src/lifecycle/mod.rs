//! # System Lifecycle
//!
//! Wiring and teardown of the marketplace. [`Marketplace`] is the
//! composition root: it builds one [`GeoShards`](geo_shard::GeoShards)
//! handle over a connector, hands a clone to every client, and on shutdown
//! releases the clients before waiting for the shard stores to stop.
//!
//! ## Shutdown order
//!
//! 1. **Drop clients** - every client holds a clone of the shard handle,
//!    which owns the cached connections.
//! 2. **Drop the shard handle** - the last cached connection senders go
//!    away and each store's receive loop ends.
//! 3. **Await stores** - the connector joins every store task.
//!
//! A store whose connection is still held elsewhere keeps running, so
//! callers must not keep clients alive past `shutdown`.

pub mod marketplace;

pub use marketplace::*;
