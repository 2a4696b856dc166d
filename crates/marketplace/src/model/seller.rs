use serde::{Deserialize, Serialize};
use std::fmt;

/// A business selling on the marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    pub id: String,
    pub business_name: String,
    pub email: String,
    pub phone: String,
    /// GST registration, stored upper-cased.
    pub gst_number: String,
    /// PAN, stored upper-cased.
    pub pan_number: String,
    pub country: String,
    #[serde(default)]
    pub state: Option<String>,
    pub status: SellerStatus,
    pub created_at: u64,
}

/// Sellers start `Pending` and need approval before they can list products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SellerStatus {
    Pending,
    Approved,
    Suspended,
}

impl fmt::Display for SellerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SellerStatus::Pending => "pending",
            SellerStatus::Approved => "approved",
            SellerStatus::Suspended => "suspended",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerCreate {
    pub business_name: String,
    pub email: String,
    pub phone: String,
    pub gst_number: String,
    pub pan_number: String,
    pub country: String,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerUpdate {
    pub business_name: Option<String>,
    pub status: Option<SellerStatus>,
}
