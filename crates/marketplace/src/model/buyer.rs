use serde::{Deserialize, Serialize};

/// A registered buyer.
///
/// Lives in the shard chosen from `country`/`state` at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buyer {
    pub id: String,
    pub name: String,
    /// Stored lower-cased; unique across all shards.
    pub email: String,
    /// Unique across all shards.
    pub phone: String,
    pub country: String,
    #[serde(default)]
    pub state: Option<String>,
    pub status: BuyerStatus,
    #[serde(default)]
    pub address: Option<String>,
    pub created_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuyerStatus {
    Active,
    Blocked,
}

/// Payload for registering a buyer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerCreate {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Payload for updating a buyer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub status: Option<BuyerStatus>,
}
