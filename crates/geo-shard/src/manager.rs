//! # Connection Manager
//!
//! Caches one [`Connection`] per shard for the life of the process. The map
//! lock is held only long enough to fetch the shard's cell; the open itself
//! runs inside the cell, so concurrent first use of a shard results in one
//! open and other shards are never blocked behind it. A failed open leaves
//! the cell empty and the next caller tries again.

use crate::connector::Connector;
use crate::document::Document;
use crate::error::ShardError;
use crate::filter::Filter;
use crate::key::ShardKey;
use crate::store::Connection;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tokio::time::timeout;
use tracing::{debug, info, warn};

pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    slots: Mutex<HashMap<ShardKey, Arc<OnceCell<Connection>>>>,
    connect_timeout: Duration,
}

impl ConnectionManager {
    pub fn new(connector: Arc<dyn Connector>, connect_timeout: Duration) -> Self {
        Self {
            connector,
            slots: Mutex::new(HashMap::new()),
            connect_timeout,
        }
    }

    /// The cached connection for `shard`, opening it on first use.
    pub async fn get_connection(&self, shard: ShardKey) -> Result<Connection, ShardError> {
        let cell = {
            let mut slots = self.slots.lock().await;
            slots.entry(shard).or_default().clone()
        };
        let conn = cell.get_or_try_init(|| self.open(shard)).await?;
        Ok(conn.clone())
    }

    async fn open(&self, shard: ShardKey) -> Result<Connection, ShardError> {
        debug!(shard = %shard, "Opening connection");
        match timeout(self.connect_timeout, self.connector.open(shard)).await {
            Ok(Ok(conn)) => {
                info!(shard = %shard, "Connection opened");
                Ok(conn)
            }
            Ok(Err(e)) => {
                warn!(shard = %shard, error = %e, "Open failed");
                Err(e)
            }
            Err(_) => {
                let millis = self.connect_timeout.as_millis() as u64;
                warn!(shard = %shard, millis, "Open timed out");
                Err(ShardError::Timeout { shard, millis })
            }
        }
    }

    /// Forgets the cached connection for `shard`; the next call reopens.
    pub async fn evict(&self, shard: ShardKey) {
        if self.slots.lock().await.remove(&shard).is_some() {
            info!(shard = %shard, "Connection evicted");
        }
    }

    /// Shards that currently hold an open connection, in candidate order.
    pub async fn cached_shards(&self) -> Vec<ShardKey> {
        let slots = self.slots.lock().await;
        ShardKey::CANDIDATES
            .iter()
            .copied()
            .filter(|key| slots.get(key).is_some_and(|cell| cell.initialized()))
            .collect()
    }

    /// Runs `find` on one shard, bounded by `query_timeout`.
    ///
    /// A connection whose store has gone away is evicted before the error is
    /// returned.
    pub async fn find_in(
        &self,
        shard: ShardKey,
        collection: &str,
        filter: Filter,
        query_timeout: Duration,
    ) -> Result<Vec<Document>, ShardError> {
        let conn = self.get_connection(shard).await?;
        let result = match timeout(query_timeout, conn.find(collection, filter)).await {
            Ok(result) => result,
            Err(_) => Err(ShardError::Timeout {
                shard,
                millis: query_timeout.as_millis() as u64,
            }),
        };
        if let Err(e) = &result {
            if e.is_connection_lost() {
                self.evict(shard).await;
            }
        }
        result
    }
}
