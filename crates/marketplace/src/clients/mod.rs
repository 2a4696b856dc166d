//! # Clients
//!
//! One client per entity. Each holds the shared [`GeoShards`](geo_shard::GeoShards)
//! handle and implements [`ShardClient`](geo_shard::ShardClient) for by-id
//! reads, deletes and admin listing; placement and cross-entity rules live
//! in the client's own methods.

pub mod buyer_client;
pub mod order_client;
pub mod product_client;
pub mod seller_client;

pub use buyer_client::BuyerClient;
pub use order_client::OrderClient;
pub use product_client::ProductClient;
pub use seller_client::SellerClient;
