//! Sharding layer configuration.
use crate::locator::ProbeMode;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Tunables for connections, probes and admin listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardConfig {
    /// Request channel capacity of each shard store.
    pub store_buffer: usize,
    pub connect_timeout_ms: u64,
    pub query_timeout_ms: u64,
    pub probe_mode: ProbeMode,
    /// Fail uniqueness checks that could not reach every shard.
    pub strict_uniqueness: bool,
    pub max_page_size: usize,
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self {
            store_buffer: 32,
            connect_timeout_ms: 2_000,
            query_timeout_ms: 3_000,
            probe_mode: ProbeMode::Sequential,
            strict_uniqueness: false,
            max_page_size: 100,
        }
    }
}

impl ShardConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `GEO_SHARD_STORE_BUFFER` - Store request queue size (default: 32)
    /// - `GEO_SHARD_CONNECT_TIMEOUT_MS` - Budget for opening a shard (default: 2000)
    /// - `GEO_SHARD_QUERY_TIMEOUT_MS` - Budget for one shard query (default: 3000)
    /// - `GEO_SHARD_PROBE_MODE` - `sequential` or `race` (default: sequential)
    /// - `GEO_SHARD_STRICT_UNIQUENESS` - Fail uniqueness checks on skipped shards (default: false)
    /// - `GEO_SHARD_MAX_PAGE_SIZE` - Upper bound for `limit` in list views (default: 100)
    ///
    /// Unset or unparsable variables keep their default.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(buffer) = read_env::<usize>("GEO_SHARD_STORE_BUFFER") {
            config.store_buffer = buffer.max(1);
        }
        if let Some(ms) = read_env::<u64>("GEO_SHARD_CONNECT_TIMEOUT_MS") {
            config.connect_timeout_ms = ms;
        }
        if let Some(ms) = read_env::<u64>("GEO_SHARD_QUERY_TIMEOUT_MS") {
            config.query_timeout_ms = ms;
        }
        if let Some(mode) = read_env::<ProbeMode>("GEO_SHARD_PROBE_MODE") {
            config.probe_mode = mode;
        }
        if let Some(strict) = read_env::<bool>("GEO_SHARD_STRICT_UNIQUENESS") {
            config.strict_uniqueness = strict;
        }
        if let Some(size) = read_env::<usize>("GEO_SHARD_MAX_PAGE_SIZE") {
            config.max_page_size = size.max(1);
        }

        config
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.trim().parse().ok()
}
