use serde::{Deserialize, Serialize};

/// A product listing. Lives in its seller's shard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub seller_id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub stock: i64,
    pub country: String,
    #[serde(default)]
    pub state: Option<String>,
    pub created_at: u64,
}

/// Payload a seller submits for a new product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub seller_id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub stock: i64,
}

/// A new product placed next to its seller.
#[derive(Debug, Clone)]
pub struct ProductCreate {
    pub product: NewProduct,
    pub country: String,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
}
