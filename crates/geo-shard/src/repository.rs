//! # Repository
//!
//! Binds one shard connection to one entity type's collection. Everything a
//! `Repository` does happens in that single shard; finding the right shard
//! is the caller's job.

use crate::document::{field, next_timestamp, values_equal, Document, ID_FIELD};
use crate::entity::ShardEntity;
use crate::error::ShardError;
use crate::filter::{Filter, Predicate};
use crate::key::ShardKey;
use crate::store::{Change, Connection};
use serde_json::Value;
use std::marker::PhantomData;
use tracing::debug;

/// Reads [`Repository::update`] makes before giving up to concurrent writers.
const UPDATE_ATTEMPTS: usize = 16;

pub struct Repository<T: ShardEntity> {
    conn: Connection,
    _entity: PhantomData<fn() -> T>,
}

impl<T: ShardEntity> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self::new(self.conn.clone())
    }
}

impl<T: ShardEntity> Repository<T> {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            _entity: PhantomData,
        }
    }

    pub fn shard(&self) -> ShardKey {
        self.conn.shard()
    }

    /// Builds a record from `params` and stores it; returns it with its id.
    pub async fn create(&self, params: T::Create) -> Result<T, T::Error> {
        let record = T::from_create_params(params, next_timestamp())?;
        self.insert(record).await
    }

    /// Stores a record built elsewhere. The store assigns a fresh id.
    pub async fn insert(&self, record: T) -> Result<T, T::Error> {
        let mut doc = record.to_document()?;
        doc.remove(ID_FIELD);
        let stored = self.conn.insert(T::COLLECTION, doc).await?;
        let record = T::from_document(stored)?;
        debug!(shard = %self.shard(), collection = T::COLLECTION, id = record.id(), "Created");
        Ok(record)
    }

    pub async fn get(&self, id: &str) -> Result<Option<T>, T::Error> {
        self.find_one(Filter::eq(ID_FIELD, id)).await
    }

    pub async fn find(&self, filter: Filter) -> Result<Vec<T>, T::Error> {
        let docs = self.find_documents(filter).await?;
        let records = docs
            .into_iter()
            .map(T::from_document)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub async fn find_one(&self, filter: Filter) -> Result<Option<T>, T::Error> {
        let doc = self.find_documents(filter).await?.into_iter().next();
        Ok(doc.map(T::from_document).transpose()?)
    }

    /// Matching documents without decoding them.
    pub async fn find_documents(&self, filter: Filter) -> Result<Vec<Document>, ShardError> {
        self.conn.find(T::COLLECTION, filter).await
    }

    /// Read-modify-write through [`ShardEntity::on_update`].
    ///
    /// Only the fields the update changed are written, guarded on the values
    /// that were read. When another writer got to one of those fields first
    /// the record is read again and the update re-applied, so `on_update`
    /// always judges the state it is written over.
    pub async fn update(&self, id: &str, update: T::Update) -> Result<T, T::Error> {
        for attempt in 1..=UPDATE_ATTEMPTS {
            let before = self
                .find_documents(Filter::eq(ID_FIELD, id))
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| self.not_found(id))?;
            let mut record = T::from_document(before.clone())?;
            record.on_update(update.clone())?;

            let (guard, changes) = diff(&before, &record.to_document()?);
            if changes.is_empty() {
                return Ok(record);
            }
            match self.conn.update(T::COLLECTION, id, guard, changes).await {
                Ok(doc) => return Ok(T::from_document(doc)?),
                Err(ShardError::Conflict { .. }) => {
                    debug!(shard = %self.shard(), collection = T::COLLECTION, id, attempt, "Concurrent write, re-reading");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(ShardError::Conflict {
            collection: T::COLLECTION.to_string(),
            id: id.to_string(),
            reason: format!("still contended after {UPDATE_ATTEMPTS} attempts"),
        }
        .into())
    }

    /// Applies `changes` only if the stored record matches `guard`, as one
    /// step inside the shard. A failed guard is `ShardError::Conflict`.
    pub async fn update_where(
        &self,
        id: &str,
        guard: Filter,
        changes: Vec<Change>,
    ) -> Result<T, T::Error> {
        let doc = self.conn.update(T::COLLECTION, id, guard, changes).await?;
        Ok(T::from_document(doc)?)
    }

    /// Removes the record; `NotFound` if this shard does not hold it.
    pub async fn delete(&self, id: &str) -> Result<(), T::Error> {
        if self.conn.delete(T::COLLECTION, id).await? {
            Ok(())
        } else {
            Err(self.not_found(id).into())
        }
    }

    pub async fn count(&self, filter: Filter) -> Result<usize, T::Error> {
        Ok(self.conn.count(T::COLLECTION, filter).await?)
    }

    fn not_found(&self, id: &str) -> ShardError {
        ShardError::NotFound {
            collection: T::COLLECTION.to_string(),
            id: id.to_string(),
            shard: self.shard(),
        }
    }
}

/// The `Set` changes turning `before` into `after`, and a guard that holds
/// while every changed field still has its `before` value.
fn diff(before: &Document, after: &Document) -> (Filter, Vec<Change>) {
    let mut guard = Filter::all();
    let mut changes = Vec::new();
    let added = after.keys().filter(|name| !before.contains_key(*name));
    for name in before.keys().chain(added) {
        if name == ID_FIELD {
            continue;
        }
        let (old, new) = (field(before, name), field(after, name));
        let unchanged = match (old, new) {
            (Some(a), Some(b)) => values_equal(a, b),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            continue;
        }
        guard = guard.and(match old {
            Some(value) => Predicate::eq(name.clone(), value.clone()),
            None => Predicate::missing(name.clone()),
        });
        changes.push(Change::set(name.clone(), new.cloned().unwrap_or(Value::Null)));
    }
    (guard, changes)
}
