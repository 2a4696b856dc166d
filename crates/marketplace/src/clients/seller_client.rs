//! # Seller Client
use crate::model::{Seller, SellerCreate, SellerStatus, SellerUpdate};
use crate::seller::SellerError;
use crate::validation;
use async_trait::async_trait;
use geo_shard::document::next_timestamp;
use geo_shard::{GeoShards, Probe, ShardClient, ShardEntity};
use tracing::{info, instrument};

#[derive(Clone)]
pub struct SellerClient {
    shards: GeoShards,
}

impl SellerClient {
    pub fn new(shards: GeoShards) -> Self {
        Self { shards }
    }

    /// Registers a pending seller. Email, phone, GST and PAN must not exist
    /// in any shard.
    ///
    /// As with buyers, the uniqueness check runs before the write and is not
    /// atomic with it.
    #[instrument(skip(self, params), fields(email = %params.email))]
    pub async fn register(&self, params: SellerCreate) -> Result<Seller, SellerError> {
        let seller = Seller::from_create_params(params, next_timestamp())?;
        self.shards.locator().ensure_unique_record(&seller).await?;

        let repo = self
            .shards
            .place::<Seller>(Some(&seller.country), seller.state.as_deref())
            .await?;
        let seller = repo.insert(seller).await?;
        info!(id = %seller.id, shard = %repo.shard(), "Seller registered");
        Ok(seller)
    }

    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Seller>, SellerError> {
        let email = validation::email(email).map_err(SellerError::ValidationError)?;
        let located = self
            .shards
            .locator()
            .locate::<Seller>(&Probe::new("email", email))
            .await?;
        Ok(located.map(|l| l.record))
    }

    #[instrument(skip(self, update))]
    pub async fn update(&self, id: &str, update: SellerUpdate) -> Result<Seller, SellerError> {
        let (repo, _) = self.shards.home::<Seller>(&Probe::id(id)).await?;
        repo.update(id, update).await
    }

    pub async fn approve(&self, id: &str) -> Result<Seller, SellerError> {
        self.set_status(id, SellerStatus::Approved).await
    }

    pub async fn suspend(&self, id: &str) -> Result<Seller, SellerError> {
        self.set_status(id, SellerStatus::Suspended).await
    }

    async fn set_status(&self, id: &str, status: SellerStatus) -> Result<Seller, SellerError> {
        let seller = self
            .update(
                id,
                SellerUpdate {
                    status: Some(status),
                    ..SellerUpdate::default()
                },
            )
            .await?;
        info!(id, %status, "Seller status changed");
        Ok(seller)
    }
}

#[async_trait]
impl ShardClient<Seller> for SellerClient {
    fn shards(&self) -> &GeoShards {
        &self.shards
    }
}
