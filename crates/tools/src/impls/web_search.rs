use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::string_arg;
use crate::error::ToolError;
use crate::fetch::ContentFetcher;
use crate::search::{clamp_num_results, SearchProvider};
use crate::trait_def::Tool;
use ragdesk_core::{ToolContext, ToolResult};

/// `web_search`: query the search provider, or fetch one URL.
///
/// `url` wins over `query`. With neither, nothing touches the network.
pub struct WebSearchTool {
    search: Arc<dyn SearchProvider>,
    fetcher: Arc<dyn ContentFetcher>,
}

impl WebSearchTool {
    pub fn new(search: Arc<dyn SearchProvider>, fetcher: Arc<dyn ContentFetcher>) -> Self {
        Self { search, fetcher }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web using Google or fetch content from a specific URL"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query for Google search"
                },
                "url": {
                    "type": "string",
                    "description": "Specific URL to fetch content from (alternative to search)"
                },
                "num_results": {
                    "type": "number",
                    "description": "Number of search results to return (default: 5, max: 10)",
                    "default": 5
                }
            },
            "required": []
        })
    }

    async fn execute(&self, _ctx: &ToolContext, args: Value) -> Result<ToolResult, ToolError> {
        if let Some(url) = string_arg(&args, "url") {
            let content = self.fetcher.fetch(url).await?;
            return Ok(ToolResult::success(content));
        }

        if let Some(query) = string_arg(&args, "query") {
            let num_results = clamp_num_results(args.get("num_results"));
            tracing::debug!(provider = self.search.name(), query, num_results, "Running web search");
            let content = self.search.search(query, num_results).await;
            return Ok(ToolResult::success(content));
        }

        Err(ToolError::validation(
            "Either query or url parameter is required",
        ))
    }
}
