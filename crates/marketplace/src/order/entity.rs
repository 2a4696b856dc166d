//! [`ShardEntity`] implementation for [`Order`].

use super::OrderError;
use crate::model::{Order, OrderCreate, OrderStatus, OrderUpdate};
use geo_shard::ShardEntity;

impl ShardEntity for Order {
    type Create = OrderCreate;
    type Update = OrderUpdate;
    type Error = OrderError;

    const COLLECTION: &'static str = "orders";
    const SEARCH_FIELDS: &'static [&'static str] = &["id", "buyerId", "productId"];

    fn id(&self) -> &str {
        &self.id
    }

    fn from_create_params(params: OrderCreate, created_at: u64) -> Result<Self, OrderError> {
        if params.quantity <= 0 {
            return Err(OrderError::ValidationError(format!(
                "quantity must be positive, got {}",
                params.quantity
            )));
        }
        Ok(Self {
            id: String::new(),
            buyer_id: params.buyer_id,
            seller_id: params.seller_id,
            product_id: params.product_id,
            quantity: params.quantity,
            total: params.total,
            status: OrderStatus::Placed,
            country: params.country,
            state: params.state,
            created_at,
        })
    }

    fn on_update(&mut self, update: OrderUpdate) -> Result<(), OrderError> {
        if let Some(next) = update.status {
            if !self.status.can_become(next) {
                return Err(OrderError::InvalidTransition {
                    from: self.status,
                    to: next,
                });
            }
            self.status = next;
        }
        Ok(())
    }
}
