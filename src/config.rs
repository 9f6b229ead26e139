//! Environment-driven application settings
//!
//! All knobs are read once at startup from environment variables, with
//! defaults matching a bare local run. Nothing here touches the filesystem;
//! paths are only stored, not validated, so tools can surface their own
//! errors when a file is actually needed.

use std::env;
use std::time::Duration;

use crate::error::ConfigError;

/// Default TTL applied to weather and keyword-search cache entries
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// TTL for Google Search Console data, which changes at most daily
pub const GSC_CACHE_TTL_SECS: u64 = 86_400;

/// Application settings, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Requested metrics backend ("log" or "jsonl")
    pub metrics_backend: String,
    /// Destination file for the JSONL metrics backend
    pub metrics_path: String,
    /// Log filter directive (e.g. "info", "crewline=debug")
    pub log_filter: String,
    /// OpenRouter API key, preferred for multi-model keyword search
    pub openrouter_api_key: Option<String>,
    /// OpenAI API key, single-model fallback
    pub openai_api_key: Option<String>,
    /// Default chat model when only the OpenAI key is available
    pub default_model: String,
    /// Path to the Google Search Console bearer token file
    pub gsc_token_path: String,
    /// Whether tools consult the cache at all
    pub cache_enabled: bool,
    /// Default cache TTL for tools that do not override it
    pub cache_ttl: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            metrics_backend: "log".to_string(),
            metrics_path: "crewline-metrics.jsonl".to_string(),
            log_filter: "info".to_string(),
            openrouter_api_key: None,
            openai_api_key: None,
            default_model: "gpt-4o-mini".to_string(),
            gsc_token_path: "token.json".to_string(),
            cache_enabled: true,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

impl Settings {
    /// Resolves settings from the process environment.
    ///
    /// Unset variables fall back to the defaults above; set variables that
    /// cannot be parsed are a hard error rather than a silent fallback.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Settings::default();

        Ok(Self {
            metrics_backend: var_or("CREWLINE_METRICS", &defaults.metrics_backend),
            metrics_path: var_or("CREWLINE_METRICS_PATH", &defaults.metrics_path),
            log_filter: var_or("CREWLINE_LOG", &defaults.log_filter),
            openrouter_api_key: non_empty_var("OPENROUTER_API_KEY"),
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            default_model: var_or("CREWLINE_MODEL", &defaults.default_model),
            gsc_token_path: var_or("GSC_TOKEN_PATH", &defaults.gsc_token_path),
            cache_enabled: parse_var("CREWLINE_CACHE_ENABLED", defaults.cache_enabled, parse_bool)?,
            cache_ttl: parse_var("CREWLINE_CACHE_TTL_SECS", defaults.cache_ttl, parse_secs)?,
        })
    }
}

/// Returns the variable's value, or the default when unset.
fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Returns the variable's value only when set and non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parses the variable with `parse`, or returns `default` when unset.
fn parse_var<T>(
    name: &str,
    default: T,
    parse: fn(&str) -> Result<T, String>,
) -> Result<T, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => parse(&raw).map_err(|reason| ConfigError::InvalidValue {
            var: name.to_string(),
            value: raw,
            reason,
        }),
    }
}

/// Parses "true"/"false" (case-insensitive, plus 1/0) into a bool.
fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err("expected true or false".to_string()),
    }
}

/// Parses a positive integer number of seconds into a Duration.
fn parse_secs(raw: &str) -> Result<Duration, String> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| e.to_string())
}
