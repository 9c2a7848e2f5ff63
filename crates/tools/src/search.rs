//! Web Search Provider
//!
//! Google search through SerpAPI, rendered as a prose block for the model.
//! Every outcome is text: missing credentials, upstream errors and timeouts
//! produce a message carrying a manual-search fallback URL instead of an error.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::config::ToolsConfig;
use ragdesk_llm::build_http_client;

/// User agent sent to search and page hosts
pub const BOT_USER_AGENT: &str = "Mozilla/5.0 (compatible; WebBot/1.0)";

/// Default number of organic results
pub const DEFAULT_NUM_RESULTS: u32 = 5;

/// Upper bound on organic results
pub const MAX_NUM_RESULTS: u32 = 10;

/// Local results are capped independently of `num_results`
const MAX_LOCAL_RESULTS: usize = 3;

/// Trait for pluggable search providers
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider name for display
    fn name(&self) -> &str;

    /// Run a query and return formatted results or a textual failure.
    async fn search(&self, query: &str, num_results: u32) -> String;
}

/// Clamp a requested result count to `[1, 10]`.
///
/// Absent or non-numeric values take the default; fractional values are
/// truncated; out-of-range integers of any width saturate.
pub fn clamp_num_results(value: Option<&Value>) -> u32 {
    let Some(value) = value else {
        return DEFAULT_NUM_RESULTS;
    };
    if let Some(n) = value.as_i64() {
        return n.clamp(1, MAX_NUM_RESULTS as i64) as u32;
    }
    if value.as_u64().is_some() {
        return MAX_NUM_RESULTS;
    }
    match value.as_f64() {
        Some(f) if f.is_nan() => DEFAULT_NUM_RESULTS,
        Some(f) => f.trunc().clamp(1.0, MAX_NUM_RESULTS as f64) as u32,
        None => DEFAULT_NUM_RESULTS,
    }
}

/// Manual Google search URL for a query
pub fn fallback_search_url(query: &str) -> String {
    format!(
        "https://www.google.com/search?q={}",
        urlencoding::encode(query)
    )
}

// ============================================================================
// SerpAPI response shape
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct SerpApiResponse {
    #[serde(default)]
    pub knowledge_graph: Option<KnowledgeGraph>,
    #[serde(default)]
    pub answer_box: Option<AnswerBox>,
    #[serde(default)]
    pub organic_results: Vec<OrganicResult>,
    #[serde(default)]
    pub local_results: Vec<LocalResult>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KnowledgeGraph {
    pub title: Option<String>,
    pub description: Option<String>,
    pub source: Option<KnowledgeSource>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KnowledgeSource {
    pub link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnswerBox {
    pub answer: Option<String>,
    pub snippet: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrganicResult {
    pub title: Option<String>,
    pub link: Option<String>,
    pub snippet: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LocalResult {
    pub title: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub rating: Option<f64>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Render a SerpAPI response.
///
/// Sections appear in fixed order (knowledge panel, answer box, organic,
/// local), each only when present.
pub fn format_search_results(data: &SerpApiResponse, query: &str, num_results: u32) -> String {
    let mut sections: Vec<String> = Vec::new();

    if let Some(kg) = &data.knowledge_graph {
        if let (Some(title), Some(description)) = (non_empty(&kg.title), non_empty(&kg.description)) {
            sections.push(format!("**{}**\n{}", title, description));
            if let Some(link) = kg.source.as_ref().and_then(|s| non_empty(&s.link)) {
                sections.push(format!("Source: {}", link));
            }
        }
    }

    if let Some(answer_box) = &data.answer_box {
        if let Some(answer) = non_empty(&answer_box.answer) {
            sections.push(format!("**Answer**: {}", answer));
        } else if let Some(snippet) = non_empty(&answer_box.snippet) {
            let title = non_empty(&answer_box.title).unwrap_or("Answer");
            sections.push(format!("**{}**: {}", title, snippet));
        }
        if let Some(link) = non_empty(&answer_box.link) {
            sections.push(format!("Source: {}", link));
        }
    }

    if !data.organic_results.is_empty() {
        sections.push("\n**Search Results:**".to_string());
        for (index, result) in data
            .organic_results
            .iter()
            .take(num_results as usize)
            .enumerate()
        {
            let (Some(title), Some(link)) = (non_empty(&result.title), non_empty(&result.link)) else {
                continue;
            };
            let mut entry = vec![format!("{}. **{}**", index + 1, title)];
            if let Some(snippet) = non_empty(&result.snippet) {
                entry.push(format!("   {}", snippet));
            }
            entry.push(format!("   Link: {}", link));
            sections.push(entry.join("\n"));
        }
    }

    if !data.local_results.is_empty() {
        sections.push("\n**Local Results:**".to_string());
        for (index, result) in data.local_results.iter().take(MAX_LOCAL_RESULTS).enumerate() {
            let Some(title) = non_empty(&result.title) else {
                continue;
            };
            let mut entry = vec![format!("{}. **{}**", index + 1, title)];
            if let Some(address) = non_empty(&result.address) {
                entry.push(format!("   Address: {}", address));
            }
            if let Some(phone) = non_empty(&result.phone) {
                entry.push(format!("   Phone: {}", phone));
            }
            if let Some(rating) = result.rating.filter(|r| *r != 0.0) {
                entry.push(format!("   Rating: {} stars", rating));
            }
            sections.push(entry.join("\n"));
        }
    }

    if sections.is_empty() {
        return format!(
            "No results found for \"{}\". Try: {}",
            query,
            fallback_search_url(query)
        );
    }

    format!(
        "🔍 Search results for \"{}\":\n\n{}",
        query,
        sections.join("\n\n")
    )
}

// ============================================================================
// SerpApiSearch
// ============================================================================

enum SearchFailure {
    Timeout,
    Api(String),
}

/// SerpAPI-backed search provider
pub struct SerpApiSearch {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    timeout: Duration,
}

impl SerpApiSearch {
    pub fn new(config: &ToolsConfig) -> Self {
        Self {
            client: build_http_client(BOT_USER_AGENT, None),
            api_key: config.serpapi_key().map(str::to_string),
            endpoint: config.search_endpoint.clone(),
            timeout: config.search_timeout,
        }
    }

    async fn request(&self, api_key: &str, query: &str, num_results: u32) -> Result<SerpApiResponse, SearchFailure> {
        let num = num_results.min(MAX_NUM_RESULTS).to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("api_key", api_key),
                ("num", num.as_str()),
            ])
            .header("Accept", "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchFailure::Api(format!("SerpAPI returned {}", status.as_u16())));
        }

        let data: SerpApiResponse = response.json().await.map_err(classify_reqwest_error)?;
        if let Some(error) = data.error.as_deref().filter(|e| !e.is_empty()) {
            return Err(SearchFailure::Api(format!("SerpAPI error: {}", error)));
        }
        Ok(data)
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> SearchFailure {
    if err.is_timeout() {
        SearchFailure::Timeout
    } else {
        SearchFailure::Api(err.to_string())
    }
}

#[async_trait]
impl SearchProvider for SerpApiSearch {
    fn name(&self) -> &str {
        "SerpAPI"
    }

    async fn search(&self, query: &str, num_results: u32) -> String {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!("SerpAPI key not configured; returning manual search link");
            return format!(
                "🔍 Web search requires SerpAPI key. Get one at https://serpapi.com/\nFallback: {}",
                fallback_search_url(query)
            );
        };

        match self.request(api_key, query, num_results).await {
            Ok(data) => format_search_results(&data, query, num_results),
            Err(failure) => {
                let kind = match &failure {
                    SearchFailure::Timeout => "timeout",
                    SearchFailure::Api(_) => "API error",
                };
                if let SearchFailure::Api(detail) = &failure {
                    tracing::warn!(query, error = %detail, "Web search failed");
                } else {
                    tracing::warn!(query, timeout = ?self.timeout, "Web search timed out");
                }
                format!(
                    "Search failed: {}. Try: {}",
                    kind,
                    fallback_search_url(query)
                )
            }
        }
    }
}
