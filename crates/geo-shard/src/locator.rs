//! # Cross-Shard Locator
//!
//! Finds a record whose home shard is unknown by probing the candidate
//! shards in a fixed order. Used for login (by email), registration
//! uniqueness checks, and admin actions addressed by id.
//!
//! A shard that cannot answer is skipped with a warning; a read never fails
//! because one shard is down. Any other error ends the search.

use crate::document::{field, Document, ID_FIELD};
use crate::entity::ShardEntity;
use crate::error::ShardError;
use crate::filter::Filter;
use crate::key::ShardKey;
use crate::manager::ConnectionManager;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Display};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Equality on one field. Probes cannot express ranges or patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    field: String,
    value: String,
}

impl Probe {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn id(id: impl Into<String>) -> Self {
        Self::new(ID_FIELD, id)
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    fn filter(&self) -> Filter {
        Filter::eq(self.field.clone(), self.value.clone())
    }
}

impl Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.field, self.value)
    }
}

/// A record together with the shard it lives in.
#[derive(Debug, Clone, PartialEq)]
pub struct Located<T> {
    pub shard: ShardKey,
    pub record: T,
}

/// How the candidates are probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMode {
    /// One shard at a time, stopping at the first hit.
    #[default]
    Sequential,
    /// Every shard at once; the first hit wins and the other probes are
    /// dropped.
    Race,
}

impl FromStr for ProbeMode {
    type Err = ShardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(ProbeMode::Sequential),
            "race" => Ok(ProbeMode::Race),
            other => Err(ShardError::InvalidQuery(format!("unknown probe mode: {other}"))),
        }
    }
}

/// Result of one pass over the candidates.
struct Search {
    hit: Option<(ShardKey, Document)>,
    skipped: Vec<ShardKey>,
}

#[derive(Clone)]
pub struct Locator {
    manager: Arc<ConnectionManager>,
    mode: ProbeMode,
    query_timeout: Duration,
    strict_uniqueness: bool,
}

impl Locator {
    pub fn new(
        manager: Arc<ConnectionManager>,
        mode: ProbeMode,
        query_timeout: Duration,
        strict_uniqueness: bool,
    ) -> Self {
        Self {
            manager,
            mode,
            query_timeout,
            strict_uniqueness,
        }
    }

    pub fn mode(&self) -> ProbeMode {
        self.mode
    }

    /// The first record matching `probe`, or `None` once every candidate
    /// has been tried.
    pub async fn locate<T: ShardEntity>(
        &self,
        probe: &Probe,
    ) -> Result<Option<Located<T>>, ShardError> {
        match self.search(T::COLLECTION, probe).await?.hit {
            Some((shard, doc)) => Ok(Some(Located {
                shard,
                record: T::from_document(doc)?,
            })),
            None => Ok(None),
        }
    }

    /// Like [`locate`](Self::locate), but a miss is `NotFoundAcrossShards`.
    pub async fn require<T: ShardEntity>(&self, probe: &Probe) -> Result<Located<T>, ShardError> {
        self.locate(probe)
            .await?
            .ok_or_else(|| ShardError::NotFoundAcrossShards {
                collection: T::COLLECTION.to_string(),
                criteria: probe.to_string(),
            })
    }

    /// Fails with `DuplicateAcrossShards` if any probe matches a record in
    /// any shard. Run before a write.
    ///
    /// With strict uniqueness, a probe that had to skip a shard fails with
    /// `Unreachable` since the value may exist there.
    pub async fn ensure_unique<T: ShardEntity>(&self, probes: &[Probe]) -> Result<(), ShardError> {
        for probe in probes {
            let search = self.search(T::COLLECTION, probe).await?;
            if let Some((shard, _)) = search.hit {
                warn!(shard = %shard, collection = T::COLLECTION, %probe, "Duplicate");
                return Err(ShardError::DuplicateAcrossShards {
                    collection: T::COLLECTION.to_string(),
                    field: probe.field.clone(),
                    value: probe.value.clone(),
                    shard,
                });
            }
            if self.strict_uniqueness {
                if let Some(&shard) = search.skipped.first() {
                    return Err(ShardError::Unreachable {
                        shard,
                        reason: format!("cannot verify {probe} is unique"),
                    });
                }
            }
        }
        Ok(())
    }

    /// [`ensure_unique`](Self::ensure_unique) over the record's
    /// [`UNIQUE_FIELDS`](ShardEntity::UNIQUE_FIELDS), probed with the values
    /// the record would be stored with. Unset fields are not probed.
    pub async fn ensure_unique_record<T: ShardEntity>(&self, record: &T) -> Result<(), ShardError> {
        self.ensure_unique::<T>(&unique_probes(record)?).await
    }

    async fn search(&self, collection: &str, probe: &Probe) -> Result<Search, ShardError> {
        match self.mode {
            ProbeMode::Sequential => self.search_sequential(collection, probe).await,
            ProbeMode::Race => self.search_race(collection, probe).await,
        }
    }

    async fn search_sequential(
        &self,
        collection: &str,
        probe: &Probe,
    ) -> Result<Search, ShardError> {
        let mut skipped = Vec::new();
        for shard in ShardKey::CANDIDATES {
            match self.probe_shard(shard, collection, probe).await {
                Ok(Some(doc)) => {
                    debug!(shard = %shard, collection, %probe, "Located");
                    return Ok(Search {
                        hit: Some((shard, doc)),
                        skipped,
                    });
                }
                Ok(None) => {}
                Err(e) if e.is_shard_failure() => {
                    warn!(shard = %shard, collection, %probe, error = %e, "Skipping shard");
                    skipped.push(shard);
                }
                Err(e) => return Err(e),
            }
        }
        debug!(collection, %probe, "Not found in any shard");
        Ok(Search { hit: None, skipped })
    }

    async fn search_race(&self, collection: &str, probe: &Probe) -> Result<Search, ShardError> {
        let mut probes: FuturesUnordered<_> = ShardKey::CANDIDATES
            .into_iter()
            .map(|shard| async move { (shard, self.probe_shard(shard, collection, probe).await) })
            .collect();

        let mut skipped = Vec::new();
        while let Some((shard, result)) = probes.next().await {
            match result {
                Ok(Some(doc)) => {
                    debug!(shard = %shard, collection, %probe, "Located");
                    return Ok(Search {
                        hit: Some((shard, doc)),
                        skipped,
                    });
                }
                Ok(None) => {}
                Err(e) if e.is_shard_failure() => {
                    warn!(shard = %shard, collection, %probe, error = %e, "Skipping shard");
                    skipped.push(shard);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(Search { hit: None, skipped })
    }

    async fn probe_shard(
        &self,
        shard: ShardKey,
        collection: &str,
        probe: &Probe,
    ) -> Result<Option<Document>, ShardError> {
        let docs = self
            .manager
            .find_in(shard, collection, probe.filter(), self.query_timeout)
            .await?;
        Ok(docs.into_iter().next())
    }
}

fn unique_probes<T: ShardEntity>(record: &T) -> Result<Vec<Probe>, ShardError> {
    let doc = record.to_document()?;
    let mut probes = Vec::with_capacity(T::UNIQUE_FIELDS.len());
    for &name in T::UNIQUE_FIELDS {
        match field(&doc, name) {
            Some(Value::String(value)) => probes.push(Probe::new(name, value.clone())),
            Some(other) => {
                return Err(ShardError::InvalidQuery(format!(
                    "unique field {name} of {} holds {other}, expected a string",
                    T::COLLECTION
                )))
            }
            None => {}
        }
    }
    Ok(probes)
}
