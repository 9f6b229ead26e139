//! Tools backing the crews
//!
//! Each tool is a value composed of an HTTP client, a cache key scheme, a
//! TTL, and a [`CachedFetcher`](crate::cache::CachedFetcher) that wraps its
//! external call. Tools know nothing about crews or the CLI; they expose one
//! async operation each and fail with
//! [`ExternalCallError`](crate::error::ExternalCallError).

mod gsc;
mod search;
mod weather;

pub use gsc::{GscTool, KeywordStat, SortBy};
pub use search::{KeywordSearchTool, ModelResult, Verification};
pub use weather::WeatherTool;
