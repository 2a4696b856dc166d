//! # GeoShards
//!
//! The handle domain code is given: one connection manager shared by the
//! resolver (writes), the locator (single-record reads) and the aggregator
//! (list views). Cloning is cheap.

use crate::aggregator::Aggregator;
use crate::config::ShardConfig;
use crate::connector::Connector;
use crate::entity::ShardEntity;
use crate::error::ShardError;
use crate::key::ShardKey;
use crate::locator::{Locator, Probe};
use crate::manager::ConnectionManager;
use crate::repository::Repository;
use crate::resolver::ShardResolver;
use std::sync::Arc;

#[derive(Clone)]
pub struct GeoShards {
    manager: Arc<ConnectionManager>,
    resolver: ShardResolver,
    locator: Locator,
    aggregator: Aggregator,
    config: ShardConfig,
}

impl GeoShards {
    pub fn new(connector: Arc<dyn Connector>, config: ShardConfig) -> Self {
        let manager = Arc::new(ConnectionManager::new(connector, config.connect_timeout()));
        Self {
            resolver: ShardResolver::new(manager.clone()),
            locator: Locator::new(
                manager.clone(),
                config.probe_mode,
                config.query_timeout(),
                config.strict_uniqueness,
            ),
            aggregator: Aggregator::new(manager.clone(), config.query_timeout()),
            manager,
            config,
        }
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub fn resolver(&self) -> &ShardResolver {
        &self.resolver
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn config(&self) -> &ShardConfig {
        &self.config
    }

    /// Repository for `T` in a known shard.
    pub async fn repository<T: ShardEntity>(&self, shard: ShardKey) -> Result<Repository<T>, ShardError> {
        let conn = self.manager.get_connection(shard).await?;
        Ok(Repository::new(conn))
    }

    /// Repository for `T` in the home shard of a new record, after the
    /// resolver's fallback chain.
    pub async fn place<T: ShardEntity>(
        &self,
        country: Option<&str>,
        state: Option<&str>,
    ) -> Result<Repository<T>, ShardError> {
        let (_, conn) = self.resolver.connect(country, state).await?;
        Ok(Repository::new(conn))
    }

    /// Finds the record matching `probe` and returns it with a repository
    /// bound to its shard, ready for a by-id mutation.
    pub async fn home<T: ShardEntity>(&self, probe: &Probe) -> Result<(Repository<T>, T), ShardError> {
        let located = self.locator.require::<T>(probe).await?;
        let repo = self.repository(located.shard).await?;
        Ok((repo, located.record))
    }
}
