//! # Connectors
//!
//! A [`Connector`] opens a connection to a shard. The connection manager
//! calls it at most once per shard while the connection stays healthy.
//!
//! [`InMemoryConnector`] runs one [`ShardStore`] task per shard inside the
//! process. Stores are spawned on first open and survive later reopens, so
//! data outlives an evicted connection. It also exposes the knobs failure
//! drills need: refuse opens, take a link down, add latency, and count
//! requests.

use crate::error::ShardError;
use crate::key::ShardKey;
use crate::store::{Connection, ShardStore};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Opens connections to shards.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, shard: ShardKey) -> Result<Connection, ShardError>;
}

#[derive(Default)]
struct Stores {
    connections: HashMap<ShardKey, Connection>,
    handles: Vec<JoinHandle<()>>,
}

/// Connector backed by in-process shard stores.
pub struct InMemoryConnector {
    buffer_size: usize,
    stores: Mutex<Stores>,
    refused: Mutex<HashSet<ShardKey>>,
    open_attempts: Mutex<HashMap<ShardKey, usize>>,
}

impl InMemoryConnector {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size,
            stores: Mutex::new(Stores::default()),
            refused: Mutex::new(HashSet::new()),
            open_attempts: Mutex::new(HashMap::new()),
        }
    }

    /// The store connection for `shard`, spawning the store on first use.
    async fn store(&self, shard: ShardKey) -> Connection {
        let mut stores = self.stores.lock().await;
        if let Some(conn) = stores.connections.get(&shard) {
            return conn.clone();
        }
        let (store, conn) = ShardStore::new(shard, self.buffer_size);
        stores.handles.push(tokio::spawn(store.run()));
        stores.connections.insert(shard, conn.clone());
        conn
    }

    /// Takes a shard offline: new opens are refused and requests over
    /// existing connections fail with `Unreachable`.
    pub async fn fail_shard(&self, shard: ShardKey) {
        warn!(shard = %shard, "Shard taken offline");
        self.refused.lock().await.insert(shard);
        self.store(shard).await.link().set_down(true);
    }

    pub async fn restore_shard(&self, shard: ShardKey) {
        info!(shard = %shard, "Shard restored");
        self.refused.lock().await.remove(&shard);
        self.store(shard).await.link().set_down(false);
    }

    /// Delays every request to `shard` by `latency`.
    pub async fn set_latency(&self, shard: ShardKey, latency: Duration) {
        self.store(shard).await.link().set_latency(latency);
    }

    /// Requests attempted against `shard` so far.
    pub async fn requests(&self, shard: ShardKey) -> usize {
        let stores = self.stores.lock().await;
        stores
            .connections
            .get(&shard)
            .map(|conn| conn.link().requests())
            .unwrap_or(0)
    }

    /// How many times `open` was called for `shard`.
    pub async fn open_attempts(&self, shard: ShardKey) -> usize {
        self.open_attempts
            .lock()
            .await
            .get(&shard)
            .copied()
            .unwrap_or(0)
    }

    /// Drops the connector's own handles and waits for every store to stop.
    ///
    /// Stores only stop once all other clones of their connections are gone,
    /// so drop the connection manager first.
    pub async fn shutdown(&self) {
        let stores = std::mem::take(&mut *self.stores.lock().await);
        drop(stores.connections);
        for handle in stores.handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Store task failed");
            }
        }
        info!("All shard stores stopped");
    }
}

#[async_trait]
impl Connector for InMemoryConnector {
    async fn open(&self, shard: ShardKey) -> Result<Connection, ShardError> {
        *self.open_attempts.lock().await.entry(shard).or_insert(0) += 1;
        if self.refused.lock().await.contains(&shard) {
            return Err(ShardError::Unreachable {
                shard,
                reason: "connection refused".to_string(),
            });
        }
        Ok(self.store(shard).await)
    }
}
