//! Multi-model keyword ranking search tool
//!
//! Asks several chat models in parallel to simulate search results for a
//! keyword, then checks whether any of the target names (domain, company)
//! appear in each model's answer. The verdict is a majority vote across
//! models. With an OpenRouter key the full model list is queried; with only
//! an OpenAI key a single default model is used. Individual model failures
//! count as "not found" rather than failing the whole call.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::cache::CachedFetcher;
use crate::config::Settings;
use crate::error::ExternalCallError;
use crate::observability::MetricSink;

/// Models queried in parallel through OpenRouter
const SEARCH_MODELS: [&str; 4] = [
    "openai/gpt-4o-mini",
    "google/gemini-2.5-flash-lite",
    "x-ai/grok-beta",
    "deepseek/deepseek-chat",
];

const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Per-model request timeout
const SEARCH_TIMEOUT: Duration = Duration::from_secs(60);

/// One model's answer to the simulated search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResult {
    /// Model identifier as sent to the provider
    pub model: String,
    /// Whether any target appeared in the simulated results
    pub found: bool,
    /// The model's simulated search results, when the call succeeded
    pub search_results: Option<String>,
    /// Error message, when the call failed
    pub error: Option<String>,
}

/// Aggregated verdict across all queried models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    /// The keyword that was searched
    pub keyword: String,
    /// Targets checked for in the results
    pub targets: Vec<String>,
    /// Majority vote across models
    pub consensus_found: bool,
    /// Number of models that found a target
    pub found_in_models: usize,
    /// Number of models queried
    pub total_models: usize,
    /// Per-model detail
    pub model_results: Vec<ModelResult>,
}

/// Minimal chat-completions response shape
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Tool that verifies keyword visibility through parallel model searches.
pub struct KeywordSearchTool {
    client: Client,
    fetcher: CachedFetcher<Verification>,
    base_url: String,
    api_key: Option<String>,
    models: Vec<String>,
    ttl: Duration,
}

impl KeywordSearchTool {
    /// Creates the tool, picking provider and model list from the configured
    /// keys. A missing key is not an error until a search actually runs.
    pub fn new(settings: &Settings, sink: Arc<dyn MetricSink>) -> Self {
        let (base_url, api_key, models) = match (
            settings.openrouter_api_key.clone(),
            settings.openai_api_key.clone(),
        ) {
            (Some(key), _) => (
                OPENROUTER_BASE_URL.to_string(),
                Some(key),
                SEARCH_MODELS.iter().map(|m| m.to_string()).collect(),
            ),
            (None, Some(key)) => (
                OPENAI_BASE_URL.to_string(),
                Some(key),
                vec![settings.default_model.clone()],
            ),
            (None, None) => (OPENAI_BASE_URL.to_string(), None, Vec::new()),
        };

        Self {
            client: Client::new(),
            fetcher: CachedFetcher::new("keyword_search", sink, settings.cache_enabled),
            base_url,
            api_key,
            models,
            ttl: settings.cache_ttl,
        }
    }

    /// Points the tool at a different base URL, for tests.
    #[allow(dead_code)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Searches for `keyword` and reports whether any of `targets` appears
    /// in the simulated results, with a majority-vote consensus.
    pub async fn verify(
        &self,
        keyword: &str,
        targets: &[&str],
    ) -> Result<Verification, ExternalCallError> {
        let key = cache_key(keyword, targets);
        let prompt = build_prompt(keyword);
        let owned_targets: Vec<String> = targets.iter().map(|t| t.to_string()).collect();

        let client = &self.client;
        let base_url = &self.base_url;
        let models = &self.models;
        let api_key = self.api_key.as_deref();
        let keyword = keyword.to_string();

        self.fetcher
            .fetch_with_cache(&key, self.ttl, || async move {
                let api_key = api_key.ok_or_else(|| {
                    ExternalCallError::Auth(
                        "No API key configured. Set OPENROUTER_API_KEY or OPENAI_API_KEY."
                            .to_string(),
                    )
                })?;

                let queries = models.iter().map(|model| {
                    query_model(client, base_url, api_key, model, &prompt, &owned_targets)
                });
                let model_results = join_all(queries).await;

                let total_models = model_results.len();
                let found_in_models = model_results.iter().filter(|r| r.found).count();
                Ok(Verification {
                    keyword,
                    targets: owned_targets.clone(),
                    consensus_found: is_majority(found_in_models, total_models),
                    found_in_models,
                    total_models,
                    model_results,
                })
            })
            .await
    }
}

/// Asks one model to simulate search results and checks for the targets.
///
/// Failures are folded into the result rather than propagated, so one flaky
/// model cannot sink the whole verification.
async fn query_model(
    client: &Client,
    base_url: &str,
    api_key: &str,
    model: &str,
    prompt: &str,
    targets: &[String],
) -> ModelResult {
    let body = json!({
        "model": model,
        "messages": [
            {
                "role": "system",
                "content": "You are a helpful search engine that provides realistic search results."
            },
            { "role": "user", "content": prompt }
        ],
        "temperature": 0.7,
        "max_tokens": 500
    });

    let outcome = async {
        let response = client
            .post(format!("{}/chat/completions", base_url))
            .bearer_auth(api_key)
            .json(&body)
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExternalCallError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|e| ExternalCallError::Payload(e.to_string()))?;
        payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ExternalCallError::Payload("response had no choices".to_string()))
    }
    .await;

    match outcome {
        Ok(content) => ModelResult {
            model: model.to_string(),
            found: targets_match(&content, targets),
            search_results: Some(content),
            error: None,
        },
        Err(e) => ModelResult {
            model: model.to_string(),
            found: false,
            search_results: None,
            error: Some(e.to_string()),
        },
    }
}

/// Derives the cache key for a (keyword, targets) query.
fn cache_key(keyword: &str, targets: &[&str]) -> String {
    format!(
        "search:{}:{}",
        keyword.to_lowercase(),
        targets.join(",").to_lowercase()
    )
}

/// The search-engine simulation prompt sent to every model.
fn build_prompt(keyword: &str) -> String {
    format!(
        "You are a search engine. When someone searches for \"{}\", what are the top 5 results?\n\n\
         For each result, provide:\n\
         1. The website URL or domain name\n\
         2. A brief description (1-2 sentences)\n\n\
         Format your response as a numbered list. Be realistic about what would \
         actually appear in search results for this keyword.",
        keyword
    )
}

/// Strips scheme and www. so "https://www.example.com" matches "example.com".
fn clean_target(target: &str) -> String {
    target
        .to_lowercase()
        .replace("https://", "")
        .replace("http://", "")
        .replace("www.", "")
}

/// Whether any target appears in the simulated results, either verbatim
/// (lowercased) or with scheme and www. stripped.
fn targets_match(results: &str, targets: &[String]) -> bool {
    let results_lower = results.to_lowercase();
    targets.iter().any(|target| {
        let target_lower = target.to_lowercase();
        results_lower.contains(&clean_target(target)) || results_lower.contains(&target_lower)
    })
}

/// Strict majority vote.
fn is_majority(found: usize, total: usize) -> bool {
    total > 0 && found * 2 > total
}
