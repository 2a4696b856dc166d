//! # Buyer Client
//!
//! Registration, login lookup and admin mutations for buyers.
use crate::buyer::BuyerError;
use crate::model::{Buyer, BuyerCreate, BuyerStatus, BuyerUpdate};
use crate::validation;
use async_trait::async_trait;
use geo_shard::document::next_timestamp;
use geo_shard::{GeoShards, Probe, ShardClient, ShardEntity};
use tracing::{debug, info, instrument};

#[derive(Clone)]
pub struct BuyerClient {
    shards: GeoShards,
}

impl BuyerClient {
    pub fn new(shards: GeoShards) -> Self {
        Self { shards }
    }

    /// Registers a buyer in the shard for its country and state.
    ///
    /// Email and phone are checked against every shard before anything is
    /// written. The check and the write are separate steps: two
    /// registrations racing with the same email can both pass it, as can
    /// one whose duplicate sits in a shard that was skipped while strict
    /// uniqueness is off.
    #[instrument(skip(self, params), fields(email = %params.email))]
    pub async fn register(&self, params: BuyerCreate) -> Result<Buyer, BuyerError> {
        let buyer = Buyer::from_create_params(params, next_timestamp())?;
        self.shards.locator().ensure_unique_record(&buyer).await?;

        let repo = self
            .shards
            .place::<Buyer>(Some(&buyer.country), buyer.state.as_deref())
            .await?;
        let buyer = repo.insert(buyer).await?;
        info!(id = %buyer.id, shard = %repo.shard(), "Buyer registered");
        Ok(buyer)
    }

    /// Login lookup: the buyer with this email, wherever it lives.
    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Buyer>, BuyerError> {
        let email = validation::email(email).map_err(BuyerError::ValidationError)?;
        debug!("Locating buyer");
        let located = self
            .shards
            .locator()
            .locate::<Buyer>(&Probe::new("email", email))
            .await?;
        Ok(located.map(|l| l.record))
    }

    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, id: &str, update: BuyerUpdate) -> Result<Buyer, BuyerError> {
        let (repo, _) = self.shards.home::<Buyer>(&Probe::id(id)).await?;
        repo.update(id, update).await
    }

    #[instrument(skip(self))]
    pub async fn set_status(&self, id: &str, status: BuyerStatus) -> Result<Buyer, BuyerError> {
        let buyer = self
            .update_profile(
                id,
                BuyerUpdate {
                    status: Some(status),
                    ..BuyerUpdate::default()
                },
            )
            .await?;
        info!(?status, "Buyer status changed");
        Ok(buyer)
    }

    pub async fn block(&self, id: &str) -> Result<Buyer, BuyerError> {
        self.set_status(id, BuyerStatus::Blocked).await
    }

    pub async fn unblock(&self, id: &str) -> Result<Buyer, BuyerError> {
        self.set_status(id, BuyerStatus::Active).await
    }
}

#[async_trait]
impl ShardClient<Buyer> for BuyerClient {
    fn shards(&self) -> &GeoShards {
        &self.shards
    }
}
