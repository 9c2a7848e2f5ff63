//! Tool Provider Configuration
//!
//! Every credential and budget a provider needs is passed in through this
//! value. Providers never read the process environment themselves.

use std::time::Duration;

/// Default SerpAPI endpoint
pub const SERPAPI_ENDPOINT: &str = "https://serpapi.com/search";

/// Explicit configuration for the built-in tool providers
#[derive(Debug, Clone)]
pub struct ToolsConfig {
    /// SerpAPI key; `None` puts web search in fallback mode
    pub serpapi_key: Option<String>,
    /// Search endpoint (overridable for tests and proxies)
    pub search_endpoint: String,
    pub search_timeout: Duration,
    pub fetch_timeout: Duration,
    /// Character budget for fetched page text
    pub fetch_max_chars: usize,
    /// Reject loopback/private hosts before fetching
    pub block_private_hosts: bool,
    /// n8n webhook; `None` puts workflow triggers in simulation mode
    pub n8n_webhook_url: Option<String>,
    pub workflow_timeout: Duration,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            serpapi_key: None,
            search_endpoint: SERPAPI_ENDPOINT.to_string(),
            search_timeout: Duration::from_secs(15),
            fetch_timeout: Duration::from_secs(10),
            fetch_max_chars: 4000,
            block_private_hosts: true,
            n8n_webhook_url: None,
            workflow_timeout: Duration::from_secs(30),
        }
    }
}

impl ToolsConfig {
    /// Configured SerpAPI key, ignoring blank values
    pub fn serpapi_key(&self) -> Option<&str> {
        self.serpapi_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    /// Configured webhook URL, ignoring blank values
    pub fn n8n_webhook_url(&self) -> Option<&str> {
        self.n8n_webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }
}
