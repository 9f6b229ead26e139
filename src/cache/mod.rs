//! In-memory TTL caching for external API calls
//!
//! This module provides the cache every tool routes its external calls
//! through: a plain map from key to value with expiry-on-read semantics, and
//! a fetch wrapper that consults the cache, calls through on miss, stores
//! successful results, and reports hit/miss/latency metrics. Failed fetches
//! are never cached, so errors retry on the next call. The cache lives for
//! the lifetime of the process; nothing is persisted.

mod fetch;
mod ttl;

pub use fetch::CachedFetcher;
pub use ttl::TtlCache;
