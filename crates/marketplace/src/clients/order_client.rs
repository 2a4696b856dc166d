//! # Order Client
//!
//! Placing an order touches two shards: stock is reserved in the product's
//! shard, then the order is written to the buyer's shard. If the second
//! write fails the reservation is released again.
use crate::buyer::BuyerError;
use crate::clients::ProductClient;
use crate::model::{
    Buyer, BuyerStatus, Order, OrderCreate, OrderStatus, OrderUpdate, PlaceOrder, Product,
};
use crate::order::OrderError;
use crate::product::ProductError;
use async_trait::async_trait;
use geo_shard::{GeoShards, Probe, ShardClient};
use tracing::{error, info, instrument, warn};

#[derive(Clone)]
pub struct OrderClient {
    shards: GeoShards,
    products: ProductClient,
}

impl OrderClient {
    pub fn new(shards: GeoShards, products: ProductClient) -> Self {
        Self { shards, products }
    }

    #[instrument(skip(self))]
    pub async fn place_order(&self, request: PlaceOrder) -> Result<Order, OrderError> {
        let PlaceOrder {
            buyer_id,
            product_id,
            quantity,
        } = request;
        if quantity <= 0 {
            return Err(OrderError::ValidationError(format!(
                "quantity must be positive, got {quantity}"
            )));
        }

        let buyer = self
            .shards
            .locator()
            .require::<Buyer>(&Probe::id(&buyer_id))
            .await
            .map_err(BuyerError::from)?;
        if buyer.record.status == BuyerStatus::Blocked {
            return Err(OrderError::BuyerBlocked(buyer_id));
        }

        let (product_repo, _) = self
            .shards
            .home::<Product>(&Probe::id(&product_id))
            .await
            .map_err(ProductError::from)?;
        let product = ProductClient::reserve_in(&product_repo, &product_id, quantity).await?;

        let params = OrderCreate {
            buyer_id,
            seller_id: product.seller_id.clone(),
            product_id: product_id.clone(),
            quantity,
            total: product.price * quantity as f64,
            country: buyer.record.country,
            state: buyer.record.state,
        };
        let written = match self.shards.repository::<Order>(buyer.shard).await {
            Ok(repo) => repo.create(params).await,
            Err(e) => Err(e.into()),
        };

        match written {
            Ok(order) => {
                info!(id = %order.id, shard = %buyer.shard, total = order.total, "Order placed");
                Ok(order)
            }
            Err(e) => {
                warn!(error = %e, shard = %buyer.shard, "Order write failed, releasing stock");
                if let Err(release) =
                    ProductClient::restock_in(&product_repo, &product_id, quantity).await
                {
                    error!(error = %release, product_id = %product_id, quantity, "Stock release failed");
                }
                Err(e)
            }
        }
    }

    /// Moves the order along its lifecycle. Cancelling returns the ordered
    /// quantity to stock; of several concurrent cancels only the one whose
    /// transition is written restocks, the rest see `InvalidTransition`.
    #[instrument(skip(self))]
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> Result<Order, OrderError> {
        let (repo, _) = self.shards.home::<Order>(&Probe::id(id)).await?;
        let order = repo
            .update(
                id,
                OrderUpdate {
                    status: Some(status),
                },
            )
            .await?;
        info!(%status, "Order status changed");

        if status == OrderStatus::Cancelled {
            self.products
                .restock(&order.product_id, order.quantity)
                .await?;
        }
        Ok(order)
    }
}

#[async_trait]
impl ShardClient<Order> for OrderClient {
    fn shards(&self) -> &GeoShards {
        &self.shards
    }
}
