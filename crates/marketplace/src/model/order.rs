use serde::{Deserialize, Serialize};
use std::fmt;

/// An order. Lives in the buyer's shard, whatever shard the product is in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub total: f64,
    pub status: OrderStatus,
    pub country: String,
    #[serde(default)]
    pub state: Option<String>,
    pub created_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Placed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Placed → Shipped → Delivered; anything not yet delivered can be
    /// cancelled.
    pub fn can_become(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Placed, Shipped) | (Shipped, Delivered) | (Placed, Cancelled) | (Shipped, Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Placed => "placed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// What a buyer submits at checkout.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    pub buyer_id: String,
    pub product_id: String,
    pub quantity: i64,
}

/// A fully priced order ready to be written to the buyer's shard.
#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub buyer_id: String,
    pub seller_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub total: f64,
    pub country: String,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
}
