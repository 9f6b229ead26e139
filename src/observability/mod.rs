//! Pluggable metric sinks with ranked-fallback selection
//!
//! Tools report `cache_hit`/`cache_miss` counters and fetch latency through
//! the [`MetricSink`] trait; crews report run outcomes the same way. Which
//! concrete sink backs the trait is decided once at startup: a ranked list of
//! named constructors is tried in order, a constructor failure is logged and
//! skipped, and the first success wins. The log sink sits at the end of every
//! ranking because its construction cannot fail.

mod sinks;

use std::sync::Arc;

use thiserror::Error;

use crate::config::Settings;

pub use sinks::{JsonlSink, LogSink, MemorySink, MetricEvent};

/// Destination for named counters and timers.
///
/// Implementations must swallow their own I/O problems; recording a metric
/// is never allowed to fail the operation being measured.
pub trait MetricSink: Send + Sync {
    /// Increments the named counter by one.
    fn incr(&self, name: &str, tags: &[(&str, &str)]);

    /// Records a duration observation in milliseconds.
    fn timing_ms(&self, name: &str, ms: u64, tags: &[(&str, &str)]);

    /// Flushes any buffered data. Default is a no-op.
    fn flush(&self) {}
}

/// Error raised when a sink constructor cannot initialize its backend.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The backend's output destination could not be opened
    #[error("failed to initialize metrics backend: {0}")]
    Init(#[from] std::io::Error),
}

/// A named sink constructor, tried in rank order at startup.
pub type SinkCtor = fn(&Settings) -> Result<Arc<dyn MetricSink>, SinkError>;

fn build_log_sink(_settings: &Settings) -> Result<Arc<dyn MetricSink>, SinkError> {
    Ok(Arc::new(LogSink::new()))
}

fn build_jsonl_sink(settings: &Settings) -> Result<Arc<dyn MetricSink>, SinkError> {
    Ok(Arc::new(JsonlSink::open(&settings.metrics_path)?))
}

/// Returns the constructor ranking for the requested backend.
///
/// The requested backend is ranked first; the infallible log sink always
/// terminates the list. An unrecognized backend name degrades to the log
/// sink alone (with a warning from [`select_sink`]).
pub fn ranked_backends(requested: &str) -> Vec<(&'static str, SinkCtor)> {
    match requested {
        "jsonl" => vec![("jsonl", build_jsonl_sink), ("log", build_log_sink)],
        "log" => vec![("log", build_log_sink)],
        _ => {
            tracing::warn!(backend = requested, "unknown metrics backend, using log sink");
            vec![("log", build_log_sink)]
        }
    }
}

/// Selects the metrics backend for this process.
///
/// Tries each ranked constructor in order; failures are logged at WARN and
/// are not fatal. The ranking always ends in a constructor that succeeds.
pub fn select_sink(settings: &Settings) -> Arc<dyn MetricSink> {
    for (name, ctor) in ranked_backends(&settings.metrics_backend) {
        match ctor(settings) {
            Ok(sink) => {
                tracing::info!(backend = name, "metrics backend selected");
                return sink;
            }
            Err(e) => {
                tracing::warn!(backend = name, error = %e, "metrics backend failed to initialize, trying next");
            }
        }
    }
    // Unreachable in practice: the log sink cannot fail. Kept as a hard
    // fallback so a future ranking change cannot leave us without a sink.
    Arc::new(LogSink::new())
}
