//! # Test Doubles
//!
//! Two ways to test code built on the sharding layer without real stores:
//!
//! - **Scripted store**: [`create_mock_connection`] returns a `Connection`
//!   and the receiving end of its request channel. The test plays the store,
//!   answering each request with the `expect_*` helpers. Useful for checking
//!   exactly which requests a component sends.
//! - **Scripted connector**: [`ScriptedConnector`] wraps an
//!   [`InMemoryConnector`] and lets a test fail or delay opens per shard and
//!   read back the order in which shards were opened. Useful for resolver
//!   fallback and connection-manager tests.
//!
//! ```rust
//! use geo_shard::mock::{create_mock_connection, expect_find};
//! use geo_shard::{Filter, ShardKey};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (conn, mut requests) = create_mock_connection(ShardKey::US, 4);
//!
//!     let task = tokio::spawn(async move { conn.find("buyers", Filter::all()).await });
//!
//!     let (collection, _filter, respond_to) = expect_find(&mut requests).await.unwrap();
//!     assert_eq!(collection, "buyers");
//!     respond_to.send(Ok(vec![])).unwrap();
//!
//!     assert!(task.await.unwrap().unwrap().is_empty());
//! }
//! ```

use crate::connector::{Connector, InMemoryConnector};
use crate::document::Document;
use crate::error::ShardError;
use crate::filter::Filter;
use crate::key::ShardKey;
use crate::store::{Change, Connection, Response, StoreRequest};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

// =============================================================================
// SCRIPTED STORE
// =============================================================================

pub fn create_mock_connection(
    shard: ShardKey,
    buffer_size: usize,
) -> (Connection, mpsc::Receiver<StoreRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size.max(1));
    (Connection::new(shard, sender), receiver)
}

pub async fn expect_insert(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(String, Document, Response<Document>)> {
    match receiver.recv().await {
        Some(StoreRequest::Insert {
            collection,
            document,
            respond_to,
        }) => Some((collection, document, respond_to)),
        _ => None,
    }
}

pub async fn expect_find(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(String, Filter, Response<Vec<Document>>)> {
    match receiver.recv().await {
        Some(StoreRequest::Find {
            collection,
            filter,
            respond_to,
        }) => Some((collection, filter, respond_to)),
        _ => None,
    }
}

pub async fn expect_update(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(String, Filter, Vec<Change>, Response<Document>)> {
    match receiver.recv().await {
        Some(StoreRequest::Update {
            id,
            guard,
            changes,
            respond_to,
            ..
        }) => Some((id, guard, changes, respond_to)),
        _ => None,
    }
}

// =============================================================================
// SCRIPTED CONNECTOR
// =============================================================================

#[derive(Default)]
struct Script {
    failures: HashMap<ShardKey, usize>,
    delays: HashMap<ShardKey, Duration>,
    opens: Vec<ShardKey>,
}

/// An [`InMemoryConnector`] whose opens can be made to fail or stall.
pub struct ScriptedConnector {
    inner: InMemoryConnector,
    script: Mutex<Script>,
}

impl ScriptedConnector {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            inner: InMemoryConnector::new(buffer_size),
            script: Mutex::new(Script::default()),
        }
    }

    /// The next `times` opens of `shard` fail with `Unreachable`.
    pub async fn fail_opens(&self, shard: ShardKey, times: usize) {
        *self.script.lock().await.failures.entry(shard).or_insert(0) += times;
    }

    /// Every open of `shard` waits `delay` before connecting.
    pub async fn delay_opens(&self, shard: ShardKey, delay: Duration) {
        self.script.lock().await.delays.insert(shard, delay);
    }

    /// Shards passed to `open`, in call order.
    pub async fn opens(&self) -> Vec<ShardKey> {
        self.script.lock().await.opens.clone()
    }

    pub fn inner(&self) -> &InMemoryConnector {
        &self.inner
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn open(&self, shard: ShardKey) -> Result<Connection, ShardError> {
        let (fail, delay) = {
            let mut script = self.script.lock().await;
            script.opens.push(shard);
            let fail = match script.failures.get_mut(&shard) {
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    true
                }
                _ => false,
            };
            (fail, script.delays.get(&shard).copied())
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(ShardError::Unreachable {
                shard,
                reason: "scripted failure".to_string(),
            });
        }
        self.inner.open(shard).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_scripted_store() {
        let (conn, mut requests) = create_mock_connection(ShardKey::EU, 4);

        let task = tokio::spawn(async move {
            let doc = json!({"name": "x"}).as_object().cloned().unwrap();
            conn.insert("buyers", doc).await
        });

        let (collection, mut document, respond_to) = expect_insert(&mut requests)
            .await
            .expect("Expected Insert request");
        assert_eq!(collection, "buyers");
        document.insert("id".into(), json!("buyers-eu-1"));
        respond_to.send(Ok(document)).unwrap();

        let stored = task.await.unwrap().unwrap();
        assert_eq!(stored["id"], json!("buyers-eu-1"));
    }

    #[tokio::test]
    async fn test_scripted_update_error() {
        let (conn, mut requests) = create_mock_connection(ShardKey::US, 4);
        let task = tokio::spawn(async move {
            conn.update("products", "p-1", Filter::all(), vec![Change::increment("stock", -1)])
                .await
        });

        let (id, _guard, changes, respond_to) = expect_update(&mut requests).await.unwrap();
        assert_eq!(id, "p-1");
        assert_eq!(changes, vec![Change::increment("stock", -1)]);
        respond_to
            .send(Err(ShardError::Conflict {
                collection: "products".into(),
                id,
                reason: "guard not satisfied".into(),
            }))
            .unwrap();

        assert!(matches!(
            task.await.unwrap(),
            Err(ShardError::Conflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_scripted_connector_failures_run_out() {
        let connector = ScriptedConnector::new(4);
        connector.fail_opens(ShardKey::EU, 2).await;

        assert!(connector.open(ShardKey::EU).await.is_err());
        assert!(connector.open(ShardKey::EU).await.is_err());
        assert!(connector.open(ShardKey::EU).await.is_ok());
        assert_eq!(connector.opens().await.len(), 3);
        assert_eq!(connector.inner().open_attempts(ShardKey::EU).await, 1);
    }
}
