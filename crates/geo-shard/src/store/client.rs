//! # Connection
//!
//! The client half of a shard store: a cheaply cloneable handle that turns
//! method calls into [`StoreRequest`]s.

use super::message::{Change, Response, StoreRequest};
use crate::document::Document;
use crate::error::ShardError;
use crate::filter::Filter;
use crate::key::ShardKey;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Network conditions between the application and one shard.
///
/// Shared by every clone of a connection. Failure drills flip `down` or add
/// latency; `requests` counts every request that was attempted.
#[derive(Debug, Default)]
pub struct ShardLink {
    down: AtomicBool,
    latency_ms: AtomicU64,
    requests: AtomicUsize,
}

impl ShardLink {
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn is_down(&self) -> bool {
        self.down.load(Ordering::SeqCst)
    }

    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms.load(Ordering::SeqCst))
    }

    /// Number of requests attempted over this link.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

/// A handle to one shard's store.
#[derive(Clone, Debug)]
pub struct Connection {
    shard: ShardKey,
    sender: mpsc::Sender<StoreRequest>,
    link: Arc<ShardLink>,
}

impl Connection {
    pub fn new(shard: ShardKey, sender: mpsc::Sender<StoreRequest>) -> Self {
        Self {
            shard,
            sender,
            link: Arc::new(ShardLink::default()),
        }
    }

    pub fn shard(&self) -> ShardKey {
        self.shard
    }

    pub fn link(&self) -> &Arc<ShardLink> {
        &self.link
    }

    /// True once the store behind this handle has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    pub async fn insert(&self, collection: &str, document: Document) -> Result<Document, ShardError> {
        self.request(|respond_to| StoreRequest::Insert {
            collection: collection.to_string(),
            document,
            respond_to,
        })
        .await
    }

    pub async fn find(&self, collection: &str, filter: Filter) -> Result<Vec<Document>, ShardError> {
        self.request(|respond_to| StoreRequest::Find {
            collection: collection.to_string(),
            filter,
            respond_to,
        })
        .await
    }

    pub async fn update(
        &self,
        collection: &str,
        id: &str,
        guard: Filter,
        changes: Vec<Change>,
    ) -> Result<Document, ShardError> {
        self.request(|respond_to| StoreRequest::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            guard,
            changes,
            respond_to,
        })
        .await
    }

    pub async fn delete(&self, collection: &str, id: &str) -> Result<bool, ShardError> {
        self.request(|respond_to| StoreRequest::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
            respond_to,
        })
        .await
    }

    pub async fn count(&self, collection: &str, filter: Filter) -> Result<usize, ShardError> {
        self.request(|respond_to| StoreRequest::Count {
            collection: collection.to_string(),
            filter,
            respond_to,
        })
        .await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Response<T>) -> StoreRequest,
    ) -> Result<T, ShardError> {
        self.link.requests.fetch_add(1, Ordering::SeqCst);
        if self.link.is_down() {
            return Err(ShardError::Unreachable {
                shard: self.shard,
                reason: "link down".to_string(),
            });
        }
        let latency = self.link.latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| ShardError::StoreClosed(self.shard))?;
        response
            .await
            .map_err(|_| ShardError::StoreDropped(self.shard))?
    }
}
