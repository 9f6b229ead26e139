//! wttr.in weather tool
//!
//! Fetches the current condition and temperature for a location from
//! wttr.in's plain-text endpoint, cached per lowercased location.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::cache::CachedFetcher;
use crate::config::Settings;
use crate::error::ExternalCallError;
use crate::observability::MetricSink;

/// Base URL for the wttr.in plain-text weather service
const WTTR_BASE_URL: &str = "https://wttr.in";

/// Per-request timeout for the weather service
const WTTR_TIMEOUT: Duration = Duration::from_secs(10);

/// Tool that reports current weather for a location via wttr.in.
pub struct WeatherTool {
    client: Client,
    fetcher: CachedFetcher<String>,
    base_url: String,
    ttl: Duration,
}

impl WeatherTool {
    /// Creates the tool with the configured cache TTL.
    pub fn new(settings: &Settings, sink: Arc<dyn MetricSink>) -> Self {
        Self {
            client: Client::new(),
            fetcher: CachedFetcher::new("weather", sink, settings.cache_enabled),
            base_url: WTTR_BASE_URL.to_string(),
            ttl: settings.cache_ttl,
        }
    }

    /// Points the tool at a different base URL, for tests.
    #[allow(dead_code)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetches the current weather for `location` as a short text report.
    ///
    /// Results are cached per lowercased location so repeated queries within
    /// the TTL do not hit the weather service again.
    pub async fn report(&self, location: &str) -> Result<String, ExternalCallError> {
        let key = cache_key(location);
        let url = request_url(&self.base_url, location);
        let client = &self.client;

        self.fetcher
            .fetch_with_cache(&key, self.ttl, || async move {
                let response = client.get(&url).timeout(WTTR_TIMEOUT).send().await?;
                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(ExternalCallError::Status {
                        code: status.as_u16(),
                        body,
                    });
                }

                let body = response.text().await?;
                let report = body.trim().to_string();
                if report.is_empty() {
                    return Err(ExternalCallError::Payload(
                        "empty weather response".to_string(),
                    ));
                }
                Ok(report)
            })
            .await
    }
}

/// Derives the cache key for a location query.
fn cache_key(location: &str) -> String {
    format!("weather:{}", location.to_lowercase())
}

/// Builds the wttr.in request URL.
///
/// `%C+%t` asks for the condition name and temperature only.
fn request_url(base_url: &str, location: &str) -> String {
    format!("{}/{}?format=%C+%t", base_url, location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::MemorySink;

    #[test]
    fn test_cache_key_is_lowercased_location() {
        assert_eq!(cache_key("London"), "weather:london");
        assert_eq!(cache_key("TOKYO"), "weather:tokyo");
        assert_eq!(cache_key("New York"), "weather:new york");
    }

    #[test]
    fn test_request_url_uses_condition_and_temperature_format() {
        let url = request_url("https://wttr.in", "London");
        assert_eq!(url, "https://wttr.in/London?format=%C+%t");
    }

    #[tokio::test]
    async fn test_report_surfaces_connection_errors() {
        let settings = Settings::default();
        let sink = Arc::new(MemorySink::new());
        // Point at a port nothing listens on; the request fails fast
        let tool = WeatherTool::new(&settings, sink.clone()).with_base_url("http://127.0.0.1:1");

        let result = tool.report("London").await;
        assert!(matches!(result, Err(ExternalCallError::Http(_))));
        // The failure must not poison the cache; a miss was still counted
        assert_eq!(sink.counter_total("cache_miss"), 1);
        assert_eq!(sink.counter_total("cache_hit"), 0);
    }
}
