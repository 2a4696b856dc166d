//! # Shard Resolver
//!
//! Decides where a new record lives. Resolution is a pure function of
//! `(country, state)`; what happens when that shard cannot be opened is the
//! fallback chain, which is plain data so it can be inspected and tested.

use crate::error::ShardError;
use crate::key::{location_for_state, Country, ShardKey};
use crate::manager::ConnectionManager;
use crate::store::Connection;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct ShardResolver {
    manager: Arc<ConnectionManager>,
}

impl ShardResolver {
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        Self { manager }
    }

    /// Maps a country code and, for India, a state name to a shard.
    ///
    /// Unknown or missing countries go to the US shard; Indian states
    /// without a dedicated shard go to `IN/default`.
    pub fn resolve(country: Option<&str>, state: Option<&str>) -> ShardKey {
        match country.and_then(Country::parse) {
            Some(Country::In) => state
                .and_then(location_for_state)
                .and_then(ShardKey::india_state)
                .unwrap_or(ShardKey::IN_DEFAULT),
            Some(Country::Eu) => ShardKey::EU,
            Some(Country::Us) | None => ShardKey::US,
        }
    }

    /// Shards to try, in order, when `key` cannot be opened: the key itself,
    /// its country's generic shard, then the US shard. No shard appears
    /// twice.
    pub fn fallback_chain(key: ShardKey) -> Vec<ShardKey> {
        let mut chain = Vec::with_capacity(3);
        for candidate in [key, key.country_generic(), ShardKey::US] {
            if !chain.contains(&candidate) {
                chain.push(candidate);
            }
        }
        chain
    }

    /// Resolves the home shard of a new record and opens it, walking the
    /// fallback chain on open failure.
    ///
    /// Fails with `Unreachable` naming the last shard tried once the chain
    /// is exhausted.
    pub async fn connect(
        &self,
        country: Option<&str>,
        state: Option<&str>,
    ) -> Result<(ShardKey, Connection), ShardError> {
        let resolved = Self::resolve(country, state);
        debug!(?country, ?state, shard = %resolved, "Resolved");

        let mut last_error = None;
        for shard in Self::fallback_chain(resolved) {
            match self.manager.get_connection(shard).await {
                Ok(conn) => return Ok((shard, conn)),
                Err(e) => {
                    warn!(shard = %shard, error = %e, "Shard unavailable, falling back");
                    last_error = Some((shard, e));
                }
            }
        }

        Err(match last_error {
            Some((_, e @ ShardError::Unreachable { .. })) => e,
            Some((shard, e)) => ShardError::Unreachable {
                shard,
                reason: e.to_string(),
            },
            None => ShardError::Unreachable {
                shard: resolved,
                reason: "no shard to try".to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ScriptedConnector;
    use std::time::Duration;

    #[test]
    fn test_resolve_supported_pairs() {
        let cases = [
            (Some("IN"), Some("West Bengal"), "IN/WB"),
            (Some("IN"), Some("maharashtra"), "IN/MH"),
            (Some("in"), Some(" Tamil Nadu "), "IN/TN"),
            (Some("IN"), Some("DELHI"), "IN/DL"),
            (Some("IN"), Some("Rajasthan"), "IN/RJ"),
            (Some("IN"), Some("Kerala"), "IN/default"),
            (Some("IN"), None, "IN/default"),
            (Some("US"), Some("Texas"), "US"),
            (Some("eu"), None, "EU"),
            (Some("BR"), None, "US"),
            (None, Some("Delhi"), "US"),
        ];
        for (country, state, expected) in cases {
            // Same inputs, same answer.
            for _ in 0..3 {
                assert_eq!(
                    ShardResolver::resolve(country, state).to_string(),
                    expected,
                    "{country:?}/{state:?}"
                );
            }
        }
    }

    #[test]
    fn test_fallback_chain() {
        let wb = ShardKey::india_state("WB").unwrap();
        assert_eq!(
            ShardResolver::fallback_chain(wb),
            vec![wb, ShardKey::IN_DEFAULT, ShardKey::US]
        );
        assert_eq!(
            ShardResolver::fallback_chain(ShardKey::IN_DEFAULT),
            vec![ShardKey::IN_DEFAULT, ShardKey::US]
        );
        assert_eq!(
            ShardResolver::fallback_chain(ShardKey::EU),
            vec![ShardKey::EU, ShardKey::US]
        );
        assert_eq!(ShardResolver::fallback_chain(ShardKey::US), vec![ShardKey::US]);
    }

    fn resolver(connector: Arc<ScriptedConnector>) -> ShardResolver {
        let manager = ConnectionManager::new(connector, Duration::from_secs(1));
        ShardResolver::new(Arc::new(manager))
    }

    #[tokio::test]
    async fn test_connect_walks_fallback_chain() {
        let connector = Arc::new(ScriptedConnector::new(8));
        let wb = ShardKey::india_state("WB").unwrap();
        connector.fail_opens(wb, 1).await;
        connector.fail_opens(ShardKey::IN_DEFAULT, 1).await;

        let (shard, conn) = resolver(connector.clone())
            .connect(Some("IN"), Some("West Bengal"))
            .await
            .unwrap();
        assert_eq!(shard, ShardKey::US);
        assert_eq!(conn.shard(), ShardKey::US);
        assert_eq!(
            connector.opens().await,
            vec![wb, ShardKey::IN_DEFAULT, ShardKey::US]
        );
    }

    #[tokio::test]
    async fn test_connect_stops_at_first_success() {
        let connector = Arc::new(ScriptedConnector::new(8));
        connector.fail_opens(ShardKey::EU, 1).await;

        let (shard, _) = resolver(connector.clone())
            .connect(Some("EU"), None)
            .await
            .unwrap();
        assert_eq!(shard, ShardKey::US);
        assert_eq!(connector.opens().await, vec![ShardKey::EU, ShardKey::US]);
    }

    #[tokio::test]
    async fn test_connect_fails_when_chain_exhausted() {
        let connector = Arc::new(ScriptedConnector::new(8));
        connector.fail_opens(ShardKey::EU, 1).await;
        connector.fail_opens(ShardKey::US, 1).await;

        let err = resolver(connector)
            .connect(Some("EU"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ShardError::Unreachable { shard, .. } if shard == ShardKey::US));
    }
}
