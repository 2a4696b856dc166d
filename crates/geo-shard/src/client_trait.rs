//! # ShardClient Trait
//!
//! Common operations for domain clients whose records are spread over the
//! shards: lookup and delete by id through the locator, and admin listing
//! through the aggregator.
use crate::aggregator::{AggregateQuery, ListParams, Page};
use crate::entity::ShardEntity;
use crate::locator::Probe;
use crate::shards::GeoShards;
use async_trait::async_trait;

/// Trait for domain clients to inherit cross-shard reads and deletes.
///
/// Implementors only provide access to the shared [`GeoShards`] handle.
#[async_trait]
pub trait ShardClient<T: ShardEntity>: Send + Sync {
    fn shards(&self) -> &GeoShards;

    /// Fetch a record by id from whichever shard holds it.
    #[tracing::instrument(skip(self), fields(collection = T::COLLECTION))]
    async fn get(&self, id: &str) -> Result<Option<T>, T::Error> {
        tracing::debug!("Locating record");
        let located = self.shards().locator().locate::<T>(&Probe::id(id)).await?;
        Ok(located.map(|l| l.record))
    }

    /// Delete a record by id from its home shard.
    #[tracing::instrument(skip(self), fields(collection = T::COLLECTION))]
    async fn delete(&self, id: &str) -> Result<(), T::Error> {
        let (repo, _) = self.shards().home::<T>(&Probe::id(id)).await?;
        repo.delete(id).await?;
        tracing::info!(shard = %repo.shard(), "Deleted");
        Ok(())
    }

    /// Admin list view from raw request parameters.
    #[tracing::instrument(skip(self), fields(collection = T::COLLECTION))]
    async fn list(&self, params: ListParams) -> Result<Page<T>, T::Error> {
        let query = params.into_query(self.shards().config().max_page_size)?;
        self.list_query(query).await
    }

    /// Admin list view from an already built query.
    async fn list_query(&self, query: AggregateQuery) -> Result<Page<T>, T::Error> {
        let page = self.shards().aggregator().list::<T>(&query).await?;
        tracing::debug!(total = page.total, partial = page.partial, "Listed");
        Ok(page)
    }
}
