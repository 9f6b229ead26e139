//! Concrete metric sink implementations
//!
//! `LogSink` turns metrics into tracing events and can always be built.
//! `JsonlSink` appends one JSON object per metric to a file and fails to
//! build when the file cannot be opened, which is what exercises the ranked
//! fallback. `MemorySink` records everything in memory for assertions.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use serde::Serialize;

use super::{MetricSink, SinkError};

fn format_tags(tags: &[(&str, &str)]) -> String {
    tags.iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}

/// Sink that emits every metric as a tracing event.
///
/// This is the terminal fallback: it has no resources to acquire, so its
/// construction cannot fail.
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    /// Creates the sink.
    pub fn new() -> Self {
        Self
    }
}

impl MetricSink for LogSink {
    fn incr(&self, name: &str, tags: &[(&str, &str)]) {
        tracing::debug!(target: "crewline::metrics", metric = name, value = 1u64, tags = %format_tags(tags), "counter");
    }

    fn timing_ms(&self, name: &str, ms: u64, tags: &[(&str, &str)]) {
        tracing::debug!(target: "crewline::metrics", metric = name, ms, tags = %format_tags(tags), "timer");
    }
}

/// One line of JSONL metrics output
#[derive(Debug, Serialize)]
struct MetricRecord<'a> {
    ts: String,
    kind: &'static str,
    metric: &'a str,
    value: u64,
    tags: Vec<(&'a str, &'a str)>,
}

/// Sink that appends metrics to a JSON-lines file.
///
/// Construction opens (and creates if needed) the destination file and fails
/// if that is not possible. Write errors after construction are logged and
/// dropped; metrics must never fail the operation being measured.
pub struct JsonlSink {
    file: Mutex<File>,
}

impl JsonlSink {
    /// Opens the sink, creating the file if it does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    fn write_record(&self, record: &MetricRecord<'_>) {
        let line = match serde_json::to_string(record) {
            Ok(line) => line,
            Err(e) => {
                tracing::debug!(error = %e, "failed to serialize metric record");
                return;
            }
        };
        let mut file = match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(file, "{}", line) {
            tracing::debug!(error = %e, "failed to write metric record");
        }
    }
}

impl MetricSink for JsonlSink {
    fn incr(&self, name: &str, tags: &[(&str, &str)]) {
        self.write_record(&MetricRecord {
            ts: Utc::now().to_rfc3339(),
            kind: "counter",
            metric: name,
            value: 1,
            tags: tags.to_vec(),
        });
    }

    fn timing_ms(&self, name: &str, ms: u64, tags: &[(&str, &str)]) {
        self.write_record(&MetricRecord {
            ts: Utc::now().to_rfc3339(),
            kind: "timer",
            metric: name,
            value: ms,
            tags: tags.to_vec(),
        });
    }

    fn flush(&self) {
        let mut file = match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = file.flush() {
            tracing::debug!(error = %e, "failed to flush metrics file");
        }
    }
}

/// A recorded metric event, for test assertions
#[derive(Debug, Clone, PartialEq)]
pub struct MetricEvent {
    /// Metric name
    pub name: String,
    /// Counter increment or timer milliseconds
    pub value: u64,
    /// Tag pairs as recorded
    pub tags: Vec<(String, String)>,
    /// "counter" or "timer"
    pub kind: &'static str,
}

/// In-memory sink that records every call, used by tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<MetricEvent>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, name: &str, value: u64, tags: &[(&str, &str)], kind: &'static str) {
        let mut events = match self.events.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.push(MetricEvent {
            name: name.to_string(),
            value,
            tags: tags
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            kind,
        });
    }

    /// All recorded events, in order.
    pub fn events(&self) -> Vec<MetricEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Total increments recorded for the named counter.
    pub fn counter_total(&self, name: &str) -> u64 {
        self.events()
            .iter()
            .filter(|e| e.kind == "counter" && e.name == name)
            .map(|e| e.value)
            .sum()
    }

    /// Number of timer observations recorded for the named metric.
    pub fn timing_count(&self, name: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| e.kind == "timer" && e.name == name)
            .count()
    }
}

impl MetricSink for MemorySink {
    fn incr(&self, name: &str, tags: &[(&str, &str)]) {
        self.record(name, 1, tags, "counter");
    }

    fn timing_ms(&self, name: &str, ms: u64, tags: &[(&str, &str)]) {
        self.record(name, ms, tags, "timer");
    }
}
