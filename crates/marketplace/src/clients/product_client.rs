//! # Product Client
//!
//! Products are written to their seller's shard. Stock moves through
//! guarded in-shard updates, so concurrent reservations cannot oversell.
use crate::model::{NewProduct, Product, ProductCreate, ProductUpdate, Seller, SellerStatus};
use crate::product::ProductError;
use async_trait::async_trait;
use geo_shard::{
    Change, Filter, GeoShards, ListParams, Page, Predicate, Probe, Repository, ShardClient,
    ShardError,
};
use serde_json::json;
use tracing::{debug, info, instrument};

#[derive(Clone)]
pub struct ProductClient {
    shards: GeoShards,
}

impl ProductClient {
    pub fn new(shards: GeoShards) -> Self {
        Self { shards }
    }

    /// Lists a product for an approved seller, in that seller's shard.
    #[instrument(skip(self, product), fields(seller_id = %product.seller_id))]
    pub async fn create_product(&self, product: NewProduct) -> Result<Product, ProductError> {
        let seller = match self
            .shards
            .locator()
            .require::<Seller>(&Probe::id(&product.seller_id))
            .await
        {
            Ok(located) => located,
            Err(ShardError::NotFoundAcrossShards { .. }) => {
                return Err(ProductError::SellerNotApproved(product.seller_id))
            }
            Err(e) => return Err(e.into()),
        };
        if seller.record.status != SellerStatus::Approved {
            return Err(ProductError::SellerNotApproved(product.seller_id));
        }

        let repo = self.shards.repository::<Product>(seller.shard).await?;
        let created = repo
            .create(ProductCreate {
                product,
                country: seller.record.country,
                state: seller.record.state,
            })
            .await?;
        info!(id = %created.id, shard = %seller.shard, "Product created");
        Ok(created)
    }

    #[instrument(skip(self, update))]
    pub async fn update_product(
        &self,
        id: &str,
        update: ProductUpdate,
    ) -> Result<Product, ProductError> {
        let (repo, _) = self.shards.home::<Product>(&Probe::id(id)).await?;
        repo.update(id, update).await
    }

    /// Admin override of the stock level.
    pub async fn update_stock(&self, id: &str, stock: i64) -> Result<Product, ProductError> {
        self.update_product(
            id,
            ProductUpdate {
                stock: Some(stock),
                ..ProductUpdate::default()
            },
        )
        .await
    }

    /// Takes `quantity` units out of stock, or fails with
    /// `InsufficientStock` without changing anything.
    #[instrument(skip(self))]
    pub async fn reserve_stock(&self, id: &str, quantity: i64) -> Result<Product, ProductError> {
        let (repo, _) = self.shards.home::<Product>(&Probe::id(id)).await?;
        Self::reserve_in(&repo, id, quantity).await
    }

    /// Puts `quantity` units back.
    #[instrument(skip(self))]
    pub async fn restock(&self, id: &str, quantity: i64) -> Result<Product, ProductError> {
        let (repo, _) = self.shards.home::<Product>(&Probe::id(id)).await?;
        Self::restock_in(&repo, id, quantity).await
    }

    /// Admin listing restricted to a price range. Either bound may be open.
    pub async fn list_priced(
        &self,
        params: ListParams,
        min_price: Option<f64>,
        max_price: Option<f64>,
    ) -> Result<Page<Product>, ProductError> {
        let query = params
            .into_query(self.shards.config().max_page_size)?
            .with_filter(Predicate::range(
                "price",
                min_price.map(|p| json!(p)),
                max_price.map(|p| json!(p)),
            ));
        self.list_query(query).await
    }

    pub(crate) async fn reserve_in(
        repo: &Repository<Product>,
        id: &str,
        quantity: i64,
    ) -> Result<Product, ProductError> {
        check_quantity(quantity)?;
        let guard = Filter::from(Predicate::range("stock", Some(json!(quantity)), None));
        match repo
            .update_where(id, guard, vec![Change::increment("stock", -quantity)])
            .await
        {
            Err(ProductError::Shard(ShardError::Conflict { .. })) => {
                Err(ProductError::InsufficientStock {
                    product_id: id.to_string(),
                    requested: quantity,
                })
            }
            Ok(product) => {
                debug!(id, quantity, stock = product.stock, "Stock reserved");
                Ok(product)
            }
            Err(e) => Err(e),
        }
    }

    pub(crate) async fn restock_in(
        repo: &Repository<Product>,
        id: &str,
        quantity: i64,
    ) -> Result<Product, ProductError> {
        check_quantity(quantity)?;
        let product = repo
            .update_where(id, Filter::all(), vec![Change::increment("stock", quantity)])
            .await?;
        debug!(id, quantity, stock = product.stock, "Stock released");
        Ok(product)
    }
}

fn check_quantity(quantity: i64) -> Result<(), ProductError> {
    if quantity > 0 {
        Ok(())
    } else {
        Err(ProductError::ValidationError(format!(
            "quantity must be positive, got {quantity}"
        )))
    }
}

#[async_trait]
impl ShardClient<Product> for ProductClient {
    fn shards(&self) -> &GeoShards {
        &self.shards
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_shard::mock::{create_mock_connection, expect_update};
    use geo_shard::ShardKey;

    #[tokio::test]
    async fn test_reserve_sends_guarded_decrement() {
        let (conn, mut requests) = create_mock_connection(ShardKey::EU, 4);
        let repo = Repository::<Product>::new(conn);
        let task = tokio::spawn(async move {
            ProductClient::reserve_in(&repo, "products-eu-1", 3).await
        });

        let (id, guard, changes, respond_to) = expect_update(&mut requests)
            .await
            .expect("Expected Update request");
        assert_eq!(id, "products-eu-1");
        assert_eq!(changes, vec![Change::increment("stock", -3)]);

        let stocked = json!({"stock": 3}).as_object().cloned().unwrap();
        let short = json!({"stock": 2}).as_object().cloned().unwrap();
        assert!(guard.matches(&stocked));
        assert!(!guard.matches(&short));

        respond_to
            .send(Err(ShardError::Conflict {
                collection: "products".into(),
                id,
                reason: "guard not satisfied".into(),
            }))
            .unwrap();

        assert_eq!(
            task.await.unwrap(),
            Err(ProductError::InsufficientStock {
                product_id: "products-eu-1".into(),
                requested: 3
            })
        );
    }

    #[tokio::test]
    async fn test_restock_passes_through_shard_errors() {
        let (conn, mut requests) = create_mock_connection(ShardKey::US, 4);
        let repo = Repository::<Product>::new(conn);
        let task = tokio::spawn(async move {
            ProductClient::restock_in(&repo, "products-us-1", 2).await
        });

        let (_, guard, changes, respond_to) = expect_update(&mut requests).await.unwrap();
        assert!(guard.is_empty());
        assert_eq!(changes, vec![Change::increment("stock", 2)]);
        drop(respond_to);

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, ProductError::Shard(ShardError::StoreDropped(_))));
    }

    #[tokio::test]
    async fn test_non_positive_quantity_sends_nothing() {
        let (conn, mut requests) = create_mock_connection(ShardKey::US, 4);
        let repo = Repository::<Product>::new(conn);

        let err = ProductClient::reserve_in(&repo, "products-us-1", 0)
            .await
            .unwrap_err();
        assert!(matches!(err, ProductError::ValidationError(_)));
        drop(repo);
        assert!(requests.recv().await.is_none());
    }
}
