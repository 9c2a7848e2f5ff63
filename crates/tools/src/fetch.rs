//! Page Content Fetcher
//!
//! Fetches one URL and reduces it to readable text within a character budget.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use crate::config::ToolsConfig;
use crate::error::ToolError;
use crate::search::BOT_USER_AGENT;
use crate::url_validation::validate_fetch_target;
use ragdesk_llm::build_manual_redirect_client;

/// Redirect hops followed before giving up
const MAX_REDIRECTS: usize = 5;

/// Fetches a page and returns its text rendition
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, ToolError>;
}

/// Elements whose inner text must never surface.
fn hidden_block_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        ["script", "style", "noscript"]
            .iter()
            .filter_map(|tag| Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).ok())
            .collect()
    })
}

fn markup_pattern() -> Option<&'static Regex> {
    static MARKUP: OnceLock<Option<Regex>> = OnceLock::new();
    MARKUP.get_or_init(|| Regex::new(r"<[^>]*>").ok()).as_ref()
}

/// Strip hidden blocks, then all remaining tags, then collapse whitespace.
pub fn extract_text_from_html(html: &str) -> String {
    let mut text = html.to_string();
    for pattern in hidden_block_patterns() {
        text = pattern.replace_all(&text, "").into_owned();
    }
    if let Some(markup) = markup_pattern() {
        text = markup.replace_all(&text, " ").into_owned();
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `max_chars` characters. Returns the kept prefix and
/// whether anything was dropped.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => (&text[..byte_index], true),
        None => (text, false),
    }
}

/// `reqwest`-backed fetcher with SSRF guard, timeout and text budget.
///
/// Redirects are followed by hand so every hop passes the same guard.
pub struct HttpContentFetcher {
    client: reqwest::Client,
    timeout: Duration,
    max_chars: usize,
    block_private_hosts: bool,
}

impl HttpContentFetcher {
    pub fn new(config: &ToolsConfig) -> Self {
        Self {
            client: build_manual_redirect_client(BOT_USER_AGENT, None),
            timeout: config.fetch_timeout,
            max_chars: config.fetch_max_chars,
            block_private_hosts: config.block_private_hosts,
        }
    }
}

#[async_trait]
impl ContentFetcher for HttpContentFetcher {
    async fn fetch(&self, url_str: &str) -> Result<String, ToolError> {
        let mut url = validate_fetch_target(url_str, self.block_private_hosts)
            .await
            .map_err(ToolError::Fetch)?;

        let mut redirects = 0;
        let response = loop {
            let response = self
                .client
                .get(url.clone())
                .timeout(self.timeout)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        ToolError::fetch("timeout")
                    } else {
                        ToolError::fetch(e.to_string())
                    }
                })?;

            if !response.status().is_redirection() {
                break response;
            }
            let Some(location) = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
            else {
                break response;
            };

            redirects += 1;
            if redirects > MAX_REDIRECTS {
                return Err(ToolError::fetch("too many redirects"));
            }
            let next = url
                .join(location)
                .map_err(|e| ToolError::fetch(format!("Invalid URL: {}", e)))?;
            tracing::debug!(from = %url, to = %next, "Following redirect");
            url = validate_fetch_target(next.as_str(), self.block_private_hosts)
                .await
                .map_err(ToolError::Fetch)?;
        };

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::fetch(format!("HTTP {}", status.as_u16())));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();
        if !content_type.contains("text/") {
            return Err(ToolError::fetch("Unsupported content type"));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ToolError::fetch(e.to_string()))?;

        let text = extract_text_from_html(&body);
        if text.is_empty() {
            return Ok(format!("No readable content found at {}", url_str));
        }

        let (kept, truncated) = truncate_chars(&text, self.max_chars);
        tracing::debug!(url = url_str, chars = kept.len(), truncated, "Fetched page content");
        Ok(format!(
            "Content from {}:\n\n{}{}",
            url_str,
            kept,
            if truncated { "..." } else { "" }
        ))
    }
}
