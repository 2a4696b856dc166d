//! [`ShardEntity`] implementation for [`Buyer`].

use super::BuyerError;
use crate::model::{Buyer, BuyerCreate, BuyerStatus, BuyerUpdate};
use crate::validation;
use geo_shard::ShardEntity;

impl ShardEntity for Buyer {
    type Create = BuyerCreate;
    type Update = BuyerUpdate;
    type Error = BuyerError;

    const COLLECTION: &'static str = "buyers";
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "email", "phone"];
    const UNIQUE_FIELDS: &'static [&'static str] = &["email", "phone"];
    const DEDUP_FIELD: &'static str = "email";

    fn id(&self) -> &str {
        &self.id
    }

    /// New buyers start active.
    fn from_create_params(params: BuyerCreate, created_at: u64) -> Result<Self, BuyerError> {
        Ok(Self {
            id: String::new(),
            name: validation::required("name", &params.name).map_err(BuyerError::ValidationError)?,
            email: validation::email(&params.email).map_err(BuyerError::ValidationError)?,
            phone: validation::phone(&params.phone).map_err(BuyerError::ValidationError)?,
            country: validation::required("country", &params.country)
                .map_err(BuyerError::ValidationError)?
                .to_ascii_uppercase(),
            state: validation::optional(params.state),
            status: BuyerStatus::Active,
            address: validation::optional(params.address),
            created_at,
        })
    }

    fn on_update(&mut self, update: BuyerUpdate) -> Result<(), BuyerError> {
        if let Some(name) = update.name {
            self.name = validation::required("name", &name).map_err(BuyerError::ValidationError)?;
        }
        if let Some(address) = update.address {
            self.address = validation::optional(Some(address));
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        Ok(())
    }
}
