use crate::clients::{BuyerClient, OrderClient, ProductClient, SellerClient};
use geo_shard::{GeoShards, InMemoryConnector, ShardConfig};
use std::sync::Arc;
use tracing::info;

/// The running marketplace: one client per entity over a shared set of
/// geo shards.
///
/// # Example
///
/// ```ignore
/// let market = Marketplace::in_memory(ShardConfig::default());
///
/// let buyer = market.buyers.register(buyer_data).await?;
/// let seller = market.sellers.register(seller_data).await?;
/// market.sellers.approve(&seller.id).await?;
/// let product = market.products.create_product(product_data).await?;
///
/// market.shutdown().await;
/// ```
pub struct Marketplace {
    pub buyers: BuyerClient,
    pub sellers: SellerClient,
    pub products: ProductClient,
    pub orders: OrderClient,
    shards: GeoShards,
    connector: Arc<InMemoryConnector>,
}

impl Marketplace {
    /// Builds the marketplace over in-process shard stores, one per
    /// [`ShardKey`](geo_shard::ShardKey), opened on first use.
    pub fn in_memory(config: ShardConfig) -> Self {
        let connector = Arc::new(InMemoryConnector::new(config.store_buffer));
        let shards = GeoShards::new(connector.clone(), config);

        let products = ProductClient::new(shards.clone());
        Self {
            buyers: BuyerClient::new(shards.clone()),
            sellers: SellerClient::new(shards.clone()),
            orders: OrderClient::new(shards.clone(), products.clone()),
            products,
            shards,
            connector,
        }
    }

    pub fn shards(&self) -> &GeoShards {
        &self.shards
    }

    /// Shard link controls for failure drills.
    pub fn connector(&self) -> &InMemoryConnector {
        &self.connector
    }

    /// Releases every client and waits for the shard stores to stop.
    pub async fn shutdown(self) {
        info!("Shutting down marketplace...");
        let Self {
            buyers,
            sellers,
            products,
            orders,
            shards,
            connector,
        } = self;

        let open = shards.manager().cached_shards().await;
        drop(buyers);
        drop(sellers);
        drop(products);
        drop(orders);
        drop(shards);

        connector.shutdown().await;
        info!(shards = open.len(), "Marketplace stopped");
    }
}
