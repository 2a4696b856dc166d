//! # Shard Store
//!
//! The in-process document store behind one shard. A `ShardStore` owns every
//! collection of its shard and processes requests one at a time in its own
//! task, so writes inside a shard are serialized without locks.

use super::client::Connection;
use super::message::{Change, StoreRequest};
use crate::document::{document_id, next_timestamp, Document, CREATED_AT_FIELD, ID_FIELD};
use crate::error::ShardError;
use crate::filter::Filter;
use crate::key::ShardKey;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The server half of a shard's store.
///
/// Created together with its first [`Connection`]; the store runs until
/// every clone of that connection has been dropped.
pub struct ShardStore {
    shard: ShardKey,
    receiver: mpsc::Receiver<StoreRequest>,
    collections: HashMap<String, Vec<Document>>,
    counters: HashMap<String, u64>,
}

impl ShardStore {
    /// Creates a store for `shard` and a connection to it.
    ///
    /// `buffer_size` is the request channel capacity; callers wait for space
    /// when it is full.
    pub fn new(shard: ShardKey, buffer_size: usize) -> (Self, Connection) {
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        let store = Self {
            shard,
            receiver,
            collections: HashMap::new(),
            counters: HashMap::new(),
        };
        (store, Connection::new(shard, sender))
    }

    /// Processes requests until the channel closes.
    pub async fn run(mut self) {
        let shard = self.shard;
        info!(shard = %shard, "Store started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::Insert {
                    collection,
                    document,
                    respond_to,
                } => {
                    let stored = self.insert(&collection, document);
                    debug!(shard = %shard, %collection, id = ?document_id(&stored), "Insert");
                    let _ = respond_to.send(Ok(stored));
                }
                StoreRequest::Find {
                    collection,
                    filter,
                    respond_to,
                } => {
                    let found: Vec<Document> = self
                        .documents(&collection)
                        .filter(|doc| filter.matches(doc))
                        .cloned()
                        .collect();
                    debug!(shard = %shard, %collection, hits = found.len(), "Find");
                    let _ = respond_to.send(Ok(found));
                }
                StoreRequest::Update {
                    collection,
                    id,
                    guard,
                    changes,
                    respond_to,
                } => {
                    debug!(shard = %shard, %collection, %id, ?changes, "Update");
                    let result = self.update(&collection, &id, &guard, &changes);
                    if let Err(e) = &result {
                        warn!(shard = %shard, %collection, %id, error = %e, "Update failed");
                    }
                    let _ = respond_to.send(result);
                }
                StoreRequest::Delete {
                    collection,
                    id,
                    respond_to,
                } => {
                    let removed = self.delete(&collection, &id);
                    debug!(shard = %shard, %collection, %id, removed, "Delete");
                    let _ = respond_to.send(Ok(removed));
                }
                StoreRequest::Count {
                    collection,
                    filter,
                    respond_to,
                } => {
                    let count = self
                        .documents(&collection)
                        .filter(|doc| filter.matches(doc))
                        .count();
                    debug!(shard = %shard, %collection, count, "Count");
                    let _ = respond_to.send(Ok(count));
                }
            }
        }

        let size: usize = self.collections.values().map(Vec::len).sum();
        info!(shard = %shard, size, "Shutdown");
    }

    fn documents(&self, collection: &str) -> impl Iterator<Item = &Document> {
        self.collections.get(collection).into_iter().flatten()
    }

    fn insert(&mut self, collection: &str, mut document: Document) -> Document {
        let counter = self.counters.entry(collection.to_string()).or_insert(0);
        *counter += 1;
        let id = format!("{}-{}-{}", collection, self.shard.slug(), counter);

        document.insert(ID_FIELD.to_string(), Value::String(id));
        if !document.contains_key(CREATED_AT_FIELD) {
            document.insert(CREATED_AT_FIELD.to_string(), Value::from(next_timestamp()));
        }
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());
        document
    }

    fn update(
        &mut self,
        collection: &str,
        id: &str,
        guard: &Filter,
        changes: &[Change],
    ) -> Result<Document, ShardError> {
        let shard = self.shard;
        let not_found = || ShardError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
            shard,
        };
        let doc = self
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| document_id(d) == Some(id)))
            .ok_or_else(not_found)?;

        if !guard.matches(doc) {
            return Err(ShardError::Conflict {
                collection: collection.to_string(),
                id: id.to_string(),
                reason: "guard not satisfied".to_string(),
            });
        }

        // Apply to a copy so a bad change leaves the stored document untouched.
        let mut updated = doc.clone();
        for change in changes {
            apply(&mut updated, change).map_err(|reason| ShardError::Conflict {
                collection: collection.to_string(),
                id: id.to_string(),
                reason,
            })?;
        }
        *doc = updated;
        Ok(doc.clone())
    }

    fn delete(&mut self, collection: &str, id: &str) -> bool {
        let Some(docs) = self.collections.get_mut(collection) else {
            return false;
        };
        let before = docs.len();
        docs.retain(|d| document_id(d) != Some(id));
        docs.len() != before
    }
}

fn apply(doc: &mut Document, change: &Change) -> Result<(), String> {
    match change {
        Change::Set { field, .. } | Change::Increment { field, .. } if field == ID_FIELD => {
            Err("id cannot be changed".to_string())
        }
        Change::Set { field, value } => {
            doc.insert(field.clone(), value.clone());
            Ok(())
        }
        Change::Increment { field, by } => {
            let current = doc
                .get(field)
                .and_then(Value::as_i64)
                .ok_or_else(|| format!("{field} is not an integer"))?;
            let next = current
                .checked_add(*by)
                .ok_or_else(|| format!("{field} overflow"))?;
            doc.insert(field.clone(), Value::from(next));
            Ok(())
        }
    }
}
