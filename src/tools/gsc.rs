//! Google Search Console keyword tool
//!
//! Queries the Search Console search-analytics API for a domain's top
//! performing keywords over a trailing date window. Authentication reads a
//! pre-provisioned bearer token file; a missing token surfaces as an
//! authentication error with guidance. Results are cached per
//! (domain, keyword-count, date-window) triple for a day.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::cache::CachedFetcher;
use crate::config::{Settings, GSC_CACHE_TTL_SECS};
use crate::error::ExternalCallError;
use crate::observability::MetricSink;

/// Base URL for the Search Console API
const GSC_BASE_URL: &str = "https://www.googleapis.com/webmasters/v3";

/// Per-request timeout for the Search Console API
const GSC_TIMEOUT: Duration = Duration::from_secs(30);

/// Performance metrics for one keyword, as reported by Search Console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordStat {
    /// The search query
    pub keyword: String,
    /// Clicks over the queried window
    pub clicks: u64,
    /// Impressions over the queried window
    pub impressions: u64,
    /// Click-through rate as a percentage, rounded to 2 decimals
    pub ctr: f64,
    /// Average result position, rounded to 1 decimal
    pub position: f64,
}

/// Column to order keyword results by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    /// Most clicks first
    Clicks,
    /// Most impressions first
    Impressions,
    /// Highest click-through rate first
    Ctr,
    /// Best (lowest) average position first
    Position,
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clicks" => Ok(SortBy::Clicks),
            "impressions" => Ok(SortBy::Impressions),
            "ctr" => Ok(SortBy::Ctr),
            "position" => Ok(SortBy::Position),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortBy::Clicks => "clicks",
            SortBy::Impressions => "impressions",
            SortBy::Ctr => "ctr",
            SortBy::Position => "position",
        };
        write!(f, "{}", name)
    }
}

/// Search-analytics query body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest {
    start_date: String,
    end_date: String,
    dimensions: [&'static str; 1],
    row_limit: u32,
    aggregation_type: &'static str,
}

/// Search-analytics response; `rows` is absent when there is no data
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    rows: Vec<QueryRow>,
}

#[derive(Debug, Deserialize)]
struct QueryRow {
    keys: Vec<String>,
    #[serde(default)]
    clicks: f64,
    #[serde(default)]
    impressions: f64,
    #[serde(default)]
    ctr: f64,
    #[serde(default)]
    position: f64,
}

/// Tool that fetches top keywords for a domain from Search Console.
pub struct GscTool {
    client: Client,
    fetcher: CachedFetcher<Vec<KeywordStat>>,
    base_url: String,
    token_path: String,
}

impl GscTool {
    /// Creates the tool; the token file is only read when a query misses the
    /// cache, so cached data stays usable without credentials.
    pub fn new(settings: &Settings, sink: Arc<dyn MetricSink>) -> Self {
        Self {
            client: Client::new(),
            fetcher: CachedFetcher::new("gsc", sink, settings.cache_enabled),
            base_url: GSC_BASE_URL.to_string(),
            token_path: settings.gsc_token_path.clone(),
        }
    }

    /// Points the tool at a different base URL, for tests.
    #[allow(dead_code)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetches the top `num_keywords` keywords for `domain` over the last
    /// `date_range_days` days, sorted by `sort_by`.
    ///
    /// An empty result is not an error; it means Search Console has no data
    /// for the domain in the window. Sorting happens after cache retrieval,
    /// so a cached fetch can be re-sorted by a different column.
    pub async fn top_keywords(
        &self,
        domain: &str,
        num_keywords: u32,
        date_range_days: u32,
        sort_by: SortBy,
    ) -> Result<Vec<KeywordStat>, ExternalCallError> {
        let site = normalize_domain(domain);
        let key = cache_key(&site, num_keywords, date_range_days);
        let url = format!(
            "{}/sites/{}/searchAnalytics/query",
            self.base_url,
            encode_site(&site)
        );

        let end = Utc::now().date_naive();
        let start = end - chrono::Duration::days(i64::from(date_range_days));
        let body = QueryRequest {
            start_date: start.format("%Y-%m-%d").to_string(),
            end_date: end.format("%Y-%m-%d").to_string(),
            dimensions: ["query"],
            row_limit: num_keywords,
            aggregation_type: "auto",
        };

        let client = &self.client;
        let token_path = &self.token_path;
        let mut stats = self
            .fetcher
            .fetch_with_cache(&key, Duration::from_secs(GSC_CACHE_TTL_SECS), || async move {
                let token = read_bearer_token(token_path)?;
                let response = client
                    .post(&url)
                    .bearer_auth(token)
                    .json(&body)
                    .timeout(GSC_TIMEOUT)
                    .send()
                    .await?;

                let status = response.status();
                if status.as_u16() == 401 || status.as_u16() == 403 {
                    let body = response.text().await.unwrap_or_default();
                    return Err(ExternalCallError::Auth(format!(
                        "Search Console rejected the token ({}): {}",
                        status, body
                    )));
                }
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(ExternalCallError::Status {
                        code: status.as_u16(),
                        body,
                    });
                }

                let payload: QueryResponse = response
                    .json()
                    .await
                    .map_err(|e| ExternalCallError::Payload(e.to_string()))?;
                parse_rows(payload.rows)
            })
            .await?;

        sort_stats(&mut stats, sort_by);
        Ok(stats)
    }
}

/// Derives the cache key for a query. The date window is part of the key:
/// a 7-day query must never be answered with cached 30-day rows.
fn cache_key(site: &str, num_keywords: u32, date_range_days: u32) -> String {
    format!("gsc:{}:{}:{}", site, num_keywords, date_range_days)
}

/// Prefixes bare domains with https://, matching how sites are registered
/// in Search Console.
fn normalize_domain(domain: &str) -> String {
    if domain.starts_with("http://") || domain.starts_with("https://") {
        domain.to_string()
    } else {
        format!("https://{}", domain)
    }
}

/// Percent-encodes a site URL for use as a path segment.
fn encode_site(site: &str) -> String {
    site.replace(':', "%3A").replace('/', "%2F")
}

/// Reads the bearer token from the token file.
///
/// Accepts either an `access_token` or `token` field, covering both raw
/// OAuth responses and authorized-user files.
fn read_bearer_token(path: &str) -> Result<String, ExternalCallError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        ExternalCallError::Auth(format!(
            "GSC token file not found at {} ({}). Provision a token for the \
             Search Console API and set GSC_TOKEN_PATH.",
            path, e
        ))
    })?;
    let value: serde_json::Value = serde_json::from_str(&contents)
        .map_err(|e| ExternalCallError::Auth(format!("GSC token file is not valid JSON: {}", e)))?;

    value
        .get("access_token")
        .or_else(|| value.get("token"))
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            ExternalCallError::Auth(format!(
                "GSC token file {} has no access_token or token field",
                path
            ))
        })
}

/// Converts API rows into keyword stats, rejecting rows without a query key.
fn parse_rows(rows: Vec<QueryRow>) -> Result<Vec<KeywordStat>, ExternalCallError> {
    rows.into_iter()
        .map(|row| {
            let keyword = row
                .keys
                .into_iter()
                .next()
                .ok_or_else(|| ExternalCallError::Payload("row without query key".to_string()))?;
            Ok(KeywordStat {
                keyword,
                clicks: row.clicks.round() as u64,
                impressions: row.impressions.round() as u64,
                ctr: (row.ctr * 10_000.0).round() / 100.0,
                position: (row.position * 10.0).round() / 10.0,
            })
        })
        .collect()
}

/// Orders stats by the requested column. Position sorts ascending (lower is
/// better); everything else descending.
fn sort_stats(stats: &mut [KeywordStat], sort_by: SortBy) {
    match sort_by {
        SortBy::Clicks => stats.sort_by(|a, b| b.clicks.cmp(&a.clicks)),
        SortBy::Impressions => stats.sort_by(|a, b| b.impressions.cmp(&a.impressions)),
        SortBy::Ctr => stats.sort_by(|a, b| b.ctr.total_cmp(&a.ctr)),
        SortBy::Position => stats.sort_by(|a, b| a.position.total_cmp(&b.position)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::MemorySink;
    use std::io::Write;

    fn stat(keyword: &str, clicks: u64, impressions: u64, ctr: f64, position: f64) -> KeywordStat {
        KeywordStat {
            keyword: keyword.to_string(),
            clicks,
            impressions,
            ctr,
            position,
        }
    }

    #[test]
    fn test_normalize_domain_prefixes_https() {
        assert_eq!(normalize_domain("example.com"), "https://example.com");
        assert_eq!(normalize_domain("https://example.com"), "https://example.com");
        assert_eq!(normalize_domain("http://example.com"), "http://example.com");
    }

    #[test]
    fn test_cache_key_is_domain_count_and_window() {
        assert_eq!(
            cache_key("https://example.com", 10, 30),
            "gsc:https://example.com:10:30"
        );
        assert_ne!(
            cache_key("https://example.com", 10, 30),
            cache_key("https://example.com", 10, 7)
        );
    }

    #[test]
    fn test_encode_site_escapes_path_characters() {
        assert_eq!(
            encode_site("https://example.com"),
            "https%3A%2F%2Fexample.com"
        );
    }

    #[test]
    fn test_parse_rows_converts_metrics() {
        let rows = vec![QueryRow {
            keys: vec!["best coffee".to_string()],
            clicks: 120.0,
            impressions: 3400.0,
            ctr: 0.035_29,
            position: 4.23,
        }];

        let stats = parse_rows(rows).expect("rows should parse");
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].keyword, "best coffee");
        assert_eq!(stats[0].clicks, 120);
        assert_eq!(stats[0].impressions, 3400);
        assert_eq!(stats[0].ctr, 3.53);
        assert_eq!(stats[0].position, 4.2);
    }

    #[test]
    fn test_parse_rows_rejects_row_without_key() {
        let rows = vec![QueryRow {
            keys: vec![],
            clicks: 1.0,
            impressions: 1.0,
            ctr: 0.1,
            position: 1.0,
        }];
        assert!(matches!(
            parse_rows(rows),
            Err(ExternalCallError::Payload(_))
        ));
    }

    #[test]
    fn test_response_without_rows_parses_as_empty() {
        let payload: QueryResponse = serde_json::from_str("{}").expect("valid JSON");
        assert!(payload.rows.is_empty());
    }

    #[test]
    fn test_sort_stats_by_each_column() {
        let base = vec![
            stat("a", 10, 500, 2.0, 8.0),
            stat("b", 30, 100, 30.0, 1.5),
            stat("c", 20, 900, 2.2, 4.0),
        ];

        let mut by_clicks = base.clone();
        sort_stats(&mut by_clicks, SortBy::Clicks);
        assert_eq!(by_clicks[0].keyword, "b");

        let mut by_impressions = base.clone();
        sort_stats(&mut by_impressions, SortBy::Impressions);
        assert_eq!(by_impressions[0].keyword, "c");

        let mut by_ctr = base.clone();
        sort_stats(&mut by_ctr, SortBy::Ctr);
        assert_eq!(by_ctr[0].keyword, "b");

        let mut by_position = base;
        sort_stats(&mut by_position, SortBy::Position);
        assert_eq!(by_position[0].keyword, "b");
        assert_eq!(by_position[2].keyword, "a");
    }

    #[test]
    fn test_sort_by_parses_known_columns() {
        assert_eq!("clicks".parse::<SortBy>().unwrap(), SortBy::Clicks);
        assert_eq!("CTR".parse::<SortBy>().unwrap(), SortBy::Ctr);
        assert_eq!("position".parse::<SortBy>().unwrap(), SortBy::Position);
        assert!("pageviews".parse::<SortBy>().is_err());
    }

    #[test]
    fn test_read_bearer_token_accepts_both_field_names() {
        let dir = tempfile::tempdir().expect("tempdir");

        let access = dir.path().join("access.json");
        let mut f = std::fs::File::create(&access).unwrap();
        writeln!(f, r#"{{"access_token": "abc123"}}"#).unwrap();
        assert_eq!(read_bearer_token(access.to_str().unwrap()).unwrap(), "abc123");

        let token = dir.path().join("token.json");
        let mut f = std::fs::File::create(&token).unwrap();
        writeln!(f, r#"{{"token": "xyz789"}}"#).unwrap();
        assert_eq!(read_bearer_token(token.to_str().unwrap()).unwrap(), "xyz789");
    }

    #[test]
    fn test_read_bearer_token_missing_file_is_auth_error() {
        let result = read_bearer_token("/nonexistent/token.json");
        match result {
            Err(ExternalCallError::Auth(msg)) => {
                assert!(msg.contains("GSC_TOKEN_PATH"));
            }
            other => panic!("expected Auth error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_shorter_date_window_is_not_served_from_cached_rows() {
        let sink = Arc::new(MemorySink::new());
        let tool = GscTool::new(&Settings::default(), sink.clone());
        let ttl = Duration::from_secs(GSC_CACHE_TTL_SECS);

        // Populate the cache through the 30-day key
        let monthly_key = cache_key("https://example.com", 10, 30);
        let monthly = tool
            .fetcher
            .fetch_with_cache(&monthly_key, ttl, || async {
                Ok(vec![stat("monthly keyword", 120, 3400, 3.53, 4.2)])
            })
            .await
            .unwrap();
        assert_eq!(monthly[0].keyword, "monthly keyword");

        // A 7-day query keys differently, so it fetches fresh rows instead
        // of relabeling the month's data as a week's
        let weekly_key = cache_key("https://example.com", 10, 7);
        let weekly = tool
            .fetcher
            .fetch_with_cache(&weekly_key, ttl, || async {
                Ok(vec![stat("weekly keyword", 12, 340, 3.53, 4.2)])
            })
            .await
            .unwrap();
        assert_eq!(weekly[0].keyword, "weekly keyword");
        assert_eq!(sink.counter_total("cache_miss"), 2);
        assert_eq!(sink.counter_total("cache_hit"), 0);
    }

    #[tokio::test]
    async fn test_missing_token_leaves_cache_absent() {
        let settings = Settings {
            gsc_token_path: "/nonexistent/token.json".to_string(),
            ..Settings::default()
        };
        let sink = Arc::new(MemorySink::new());
        let tool = GscTool::new(&settings, sink.clone());

        let result = tool
            .top_keywords("example.com", 10, 30, SortBy::Clicks)
            .await;
        assert!(matches!(result, Err(ExternalCallError::Auth(_))));

        // The failed fetch must not poison the cache: a second call misses
        // again rather than returning a stale failure marker
        let _ = tool
            .top_keywords("example.com", 10, 30, SortBy::Clicks)
            .await;
        assert_eq!(sink.counter_total("cache_miss"), 2);
        assert_eq!(sink.counter_total("cache_hit"), 0);
    }
}
