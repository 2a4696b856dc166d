//! # Cross-Shard Aggregator
//!
//! Admin list views over every relevant shard. The filter goes to each shard
//! concurrently; the answers are concatenated in candidate order,
//! deduplicated, sorted globally and paginated in memory.
//!
//! A shard that fails to connect, fails to answer, or exceeds the query
//! timeout is left out and named in [`Page::skipped`]. The rest of the page
//! is still correct for the shards that answered.

use crate::document::{compare_values, field, Document, CREATED_AT_FIELD};
use crate::entity::ShardEntity;
use crate::error::ShardError;
use crate::filter::{Filter, Predicate};
use crate::key::{Country, ShardKey};
use crate::manager::ConnectionManager;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// `"asc"` (any case) is ascending; everything else is descending.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("asc") {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }
}

/// What an admin list view asks for.
#[derive(Debug, Clone)]
pub struct AggregateQuery {
    /// `None` means every shard.
    pub country: Option<Country>,
    /// Exact state match, ignoring case. Narrows results, not shards.
    pub state: Option<String>,
    pub search: Option<String>,
    pub sort_by: String,
    pub order: SortOrder,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
    /// Extra conditions, ANDed with the rest.
    pub filters: Vec<Predicate>,
}

impl Default for AggregateQuery {
    fn default() -> Self {
        Self {
            country: None,
            state: None,
            search: None,
            sort_by: CREATED_AT_FIELD.to_string(),
            order: SortOrder::Desc,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            filters: Vec::new(),
        }
    }
}

impl AggregateQuery {
    pub fn with_filter(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    /// Shards the query has to visit, in candidate order.
    pub fn shards(&self) -> Vec<ShardKey> {
        match self.country {
            Some(country) => ShardKey::for_country(country),
            None => ShardKey::CANDIDATES.to_vec(),
        }
    }

    /// The filter every shard evaluates.
    pub fn filter(&self, search_fields: &[&str]) -> Result<Filter, ShardError> {
        let mut filter = Filter::all();
        if let Some(term) = self.search.as_deref().filter(|t| !t.trim().is_empty()) {
            filter = filter.and(Predicate::contains_any(search_fields, term)?);
        }
        if let Some(state) = self.state.as_deref().filter(|s| !s.trim().is_empty()) {
            filter = filter.and(Predicate::eq_ignore_case("state", state));
        }
        for predicate in &self.filters {
            filter = filter.and(predicate.clone());
        }
        Ok(filter)
    }
}

/// Query-string parameters of an admin list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListParams {
    pub page: usize,
    pub limit: usize,
    pub country: String,
    pub state: Option<String>,
    pub search: Option<String>,
    pub sort_by: String,
    pub sort_order: String,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            country: "ALL".to_string(),
            state: None,
            search: None,
            sort_by: CREATED_AT_FIELD.to_string(),
            sort_order: "desc".to_string(),
        }
    }
}

impl ListParams {
    /// Normalizes the request: page 0 becomes 1, `limit` is clamped to
    /// `1..=max_page_size`, `ALL` or a blank country means every shard.
    pub fn into_query(self, max_page_size: usize) -> Result<AggregateQuery, ShardError> {
        let country = match self.country.trim() {
            "" => None,
            c if c.eq_ignore_ascii_case("ALL") => None,
            c => Some(c.parse::<Country>()?),
        };
        let sort_by = match self.sort_by.trim() {
            "" => CREATED_AT_FIELD.to_string(),
            s => s.to_string(),
        };
        Ok(AggregateQuery {
            country,
            state: self.state.filter(|s| !s.trim().is_empty()),
            search: self.search.filter(|s| !s.trim().is_empty()),
            sort_by,
            order: SortOrder::parse(&self.sort_order),
            page: self.page.max(1),
            page_size: self.limit.clamp(1, max_page_size.max(1)),
            filters: Vec::new(),
        })
    }
}

/// One page of an aggregate read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Size of the deduplicated result across all answering shards.
    pub total: usize,
    /// True when at least one shard was skipped.
    pub partial: bool,
    pub skipped: Vec<ShardKey>,
}

#[derive(Clone)]
pub struct Aggregator {
    manager: Arc<ConnectionManager>,
    query_timeout: Duration,
}

impl Aggregator {
    pub fn new(manager: Arc<ConnectionManager>, query_timeout: Duration) -> Self {
        Self {
            manager,
            query_timeout,
        }
    }

    pub async fn list<T: ShardEntity>(&self, query: &AggregateQuery) -> Result<Page<T>, ShardError> {
        let shards = query.shards();
        let filter = query.filter(T::SEARCH_FIELDS)?;

        let answers = join_all(shards.iter().map(|&shard| {
            self.manager
                .find_in(shard, T::COLLECTION, filter.clone(), self.query_timeout)
        }))
        .await;

        let mut merged = Vec::new();
        let mut skipped = Vec::new();
        for (shard, answer) in shards.into_iter().zip(answers) {
            match answer {
                Ok(docs) => {
                    debug!(shard = %shard, collection = T::COLLECTION, hits = docs.len(), "Shard answered");
                    merged.extend(docs);
                }
                Err(e) if e.is_shard_failure() => {
                    warn!(shard = %shard, collection = T::COLLECTION, error = %e, "Skipping shard");
                    skipped.push(shard);
                }
                Err(e) => return Err(e),
            }
        }

        let mut docs = dedup(merged, T::dedup_key);
        sort_documents(&mut docs, &query.sort_by, query.order);
        let total = docs.len();
        let items = paginate(docs, query.page, query.page_size)
            .into_iter()
            .map(T::from_document)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            total,
            partial: !skipped.is_empty(),
            skipped,
        })
    }
}

/// Keeps the first document for each identity key. Documents without a key
/// are all kept.
pub fn dedup(docs: Vec<Document>, key: impl Fn(&Document) -> Option<String>) -> Vec<Document> {
    let mut seen = HashSet::new();
    docs.into_iter()
        .filter(|doc| match key(doc) {
            Some(k) => seen.insert(k),
            None => true,
        })
        .collect()
}

/// Stable sort by `sort_by`. Documents missing the field go last in both
/// directions.
pub fn sort_documents(docs: &mut [Document], sort_by: &str, order: SortOrder) {
    docs.sort_by(|a, b| match (field(a, sort_by), field(b, sort_by)) {
        (Some(x), Some(y)) => {
            let ord = compare_values(x, y);
            match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Items of 1-based `page`; empty past the end.
pub fn paginate(docs: Vec<Document>, page: usize, page_size: usize) -> Vec<Document> {
    let start = page.max(1).saturating_sub(1).saturating_mul(page_size);
    docs.into_iter().skip(start).take(page_size).collect()
}
