//! # Geo Shard
//!
//! Application-level sharding over independent document stores, one per
//! geography. Records live in exactly one shard, chosen at creation from the
//! record's country (and, for India, its state) and never moved. Because no
//! store query can span shards, this crate provides the cross-shard pieces:
//!
//! 1. **Placement** ([`ShardResolver`]) - maps `(country, state)` to a
//!    [`ShardKey`] and walks a fixed fallback chain when that shard cannot
//!    be opened.
//! 2. **Connections** ([`ConnectionManager`]) - one cached [`Connection`]
//!    per shard, opened lazily, single-flight per key.
//! 3. **Single-record reads** ([`Locator`]) - probes the candidate shards in
//!    order until a record matching a [`Probe`] turns up. Also backs
//!    cross-shard uniqueness checks.
//! 4. **List views** ([`Aggregator`]) - fans a [`Filter`] out to every
//!    relevant shard, then merges, deduplicates, sorts and paginates.
//! 5. **Per-shard access** ([`Repository`]) - typed CRUD for one
//!    [`ShardEntity`] in one shard.
//!
//! [`GeoShards`] bundles all of these around one connection manager, and
//! [`ShardClient`] gives domain clients `get`, `delete` and `list` for free.
//!
//! ## Shards
//!
//! | Key | Holds |
//! |-----|-------|
//! | `US` | United States, and every country without its own shard |
//! | `EU` | European Union |
//! | `IN/WB`, `IN/MH`, `IN/TN`, `IN/DL`, `IN/RJ` | West Bengal, Maharashtra, Tamil Nadu, Delhi, Rajasthan |
//! | `IN/default` | All other Indian states |
//!
//! ## Failure model
//!
//! Reads absorb per-shard failures: the locator skips a shard that cannot
//! answer and the aggregator reports it in [`Page::skipped`]. Writes walk
//! the fallback chain on open failure and fail once it is exhausted.
//!
//! ## Example
//!
//! ```rust
//! use geo_shard::{GeoShards, InMemoryConnector, ShardConfig, ShardKey, ShardResolver};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let connector = Arc::new(InMemoryConnector::new(16));
//!     let shards = GeoShards::new(connector.clone(), ShardConfig::default());
//!
//!     let key = ShardResolver::resolve(Some("IN"), Some("West Bengal"));
//!     assert_eq!(key.to_string(), "IN/WB");
//!
//!     let conn = shards.manager().get_connection(key).await.unwrap();
//!     assert_eq!(conn.shard(), key);
//!     assert_eq!(shards.manager().cached_shards().await, vec![key]);
//! }
//! ```

pub mod aggregator;
pub mod client_trait;
pub mod config;
pub mod connector;
pub mod document;
pub mod entity;
pub mod error;
pub mod filter;
pub mod key;
pub mod locator;
pub mod manager;
pub mod mock;
pub mod repository;
pub mod resolver;
pub mod shards;
pub mod store;
pub mod tracing;

pub use aggregator::{AggregateQuery, Aggregator, ListParams, Page, SortOrder};
pub use client_trait::ShardClient;
pub use config::ShardConfig;
pub use connector::{Connector, InMemoryConnector};
pub use document::Document;
pub use entity::ShardEntity;
pub use error::ShardError;
pub use filter::{Filter, Predicate};
pub use key::{Country, ShardKey};
pub use locator::{Located, Locator, Probe, ProbeMode};
pub use manager::ConnectionManager;
pub use repository::Repository;
pub use resolver::ShardResolver;
pub use shards::GeoShards;
pub use store::{Change, Connection};
