//! Subscriber setup for binaries built on the sharding layer.
//!
//! Every component logs with a `shard` field, so a filter such as
//! `RUST_LOG=geo_shard=debug` shows each request as it reaches a store and
//! `RUST_LOG=warn` shows only fallbacks and skipped shards.

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
