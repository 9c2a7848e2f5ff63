//! Settings Models
//!
//! Application configuration and settings data structures.

use std::path::PathBuf;
use std::time::Duration;

use ragdesk_llm::ProviderConfig;
use ragdesk_tools::config::SERPAPI_ENDPOINT;
use ragdesk_tools::ToolsConfig;
use serde::{Deserialize, Serialize};

use crate::models::session::default_model_id;

/// Application configuration stored in config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Model selected for new chat state
    pub default_model: String,
    /// OpenAI-compatible completion endpoint base
    pub llm_base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_api_key: Option<String>,
    /// SerpAPI key; unset means search falls back to a manual link
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serpapi_key: Option<String>,
    pub search_endpoint: String,
    /// n8n webhook; unset means workflow triggers are simulated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n8n_webhook_url: Option<String>,
    pub workflow_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    pub search_timeout_secs: u64,
    /// Character budget for fetched page text
    pub fetch_max_chars: usize,
    /// Refuse to fetch loopback/private addresses
    pub block_private_hosts: bool,
    /// Completion rounds per turn before tool calls stop being honored
    pub max_tool_rounds: u32,
    pub session_title_max_len: usize,
    /// Overrides ~/.ragdesk/sessions/
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_model: default_model_id().to_string(),
            llm_base_url: ProviderConfig::default().base_url,
            llm_api_key: None,
            serpapi_key: None,
            search_endpoint: SERPAPI_ENDPOINT.to_string(),
            n8n_webhook_url: None,
            workflow_timeout_secs: 30,
            fetch_timeout_secs: 10,
            search_timeout_secs: 15,
            fetch_max_chars: 4000,
            block_private_hosts: true,
            max_tool_rounds: 5,
            session_title_max_len: 40,
            sessions_dir: None,
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub default_model: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_api_key: Option<String>,
    pub serpapi_key: Option<String>,
    pub search_endpoint: Option<String>,
    pub n8n_webhook_url: Option<String>,
    pub workflow_timeout_secs: Option<u64>,
    pub fetch_timeout_secs: Option<u64>,
    pub search_timeout_secs: Option<u64>,
    pub fetch_max_chars: Option<usize>,
    pub block_private_hosts: Option<bool>,
    pub max_tool_rounds: Option<u32>,
    pub session_title_max_len: Option<usize>,
    pub sessions_dir: Option<PathBuf>,
}

/// Blank strings clear an optional credential
fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl AppConfig {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(model) = update.default_model {
            self.default_model = model;
        }
        if let Some(url) = update.llm_base_url {
            self.llm_base_url = url;
        }
        if let Some(key) = update.llm_api_key {
            self.llm_api_key = non_blank(key);
        }
        if let Some(key) = update.serpapi_key {
            self.serpapi_key = non_blank(key);
        }
        if let Some(endpoint) = update.search_endpoint {
            self.search_endpoint = endpoint;
        }
        if let Some(url) = update.n8n_webhook_url {
            self.n8n_webhook_url = non_blank(url);
        }
        if let Some(secs) = update.workflow_timeout_secs {
            self.workflow_timeout_secs = secs;
        }
        if let Some(secs) = update.fetch_timeout_secs {
            self.fetch_timeout_secs = secs;
        }
        if let Some(secs) = update.search_timeout_secs {
            self.search_timeout_secs = secs;
        }
        if let Some(max) = update.fetch_max_chars {
            self.fetch_max_chars = max;
        }
        if let Some(block) = update.block_private_hosts {
            self.block_private_hosts = block;
        }
        if let Some(rounds) = update.max_tool_rounds {
            self.max_tool_rounds = rounds;
        }
        if let Some(len) = update.session_title_max_len {
            self.session_title_max_len = len;
        }
        if let Some(dir) = update.sessions_dir {
            self.sessions_dir = Some(dir);
        }
    }

    /// Overlay credentials from the environment.
    ///
    /// Called once at startup; providers only ever see the resulting values.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("SERPAPI_KEY").and_then(non_blank) {
            self.serpapi_key = Some(key);
        }
        if let Some(url) = lookup("N8N_WEBHOOK_URL").and_then(non_blank) {
            self.n8n_webhook_url = Some(url);
        }
        if let Some(key) = lookup("LLM_API_KEY").and_then(non_blank) {
            self.llm_api_key = Some(key);
        }
        if let Some(url) = lookup("LLM_BASE_URL").and_then(non_blank) {
            self.llm_base_url = url;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.default_model.trim().is_empty() {
            return Err("default_model cannot be empty".to_string());
        }

        for (name, value) in [
            ("llm_base_url", Some(self.llm_base_url.as_str())),
            ("search_endpoint", Some(self.search_endpoint.as_str())),
            ("n8n_webhook_url", self.n8n_webhook_url.as_deref()),
        ] {
            if let Some(value) = value {
                url::Url::parse(value).map_err(|e| format!("Invalid {}: {} ({})", name, value, e))?;
            }
        }

        if self.workflow_timeout_secs == 0 || self.fetch_timeout_secs == 0 || self.search_timeout_secs == 0 {
            return Err("Provider timeouts must be at least 1 second".to_string());
        }

        if self.fetch_max_chars == 0 {
            return Err("fetch_max_chars must be positive".to_string());
        }

        if !(1..=20).contains(&self.max_tool_rounds) {
            return Err("max_tool_rounds must be between 1 and 20".to_string());
        }

        if self.session_title_max_len < 4 {
            return Err("session_title_max_len must be at least 4".to_string());
        }

        Ok(())
    }

    /// Provider settings for the built-in tools
    pub fn tools_config(&self) -> ToolsConfig {
        ToolsConfig {
            serpapi_key: self.serpapi_key.clone(),
            search_endpoint: self.search_endpoint.clone(),
            search_timeout: Duration::from_secs(self.search_timeout_secs),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            fetch_max_chars: self.fetch_max_chars,
            block_private_hosts: self.block_private_hosts,
            n8n_webhook_url: self.n8n_webhook_url.clone(),
            workflow_timeout: Duration::from_secs(self.workflow_timeout_secs),
        }
    }

    /// Connection settings for the completion backend
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            base_url: self.llm_base_url.clone(),
            api_key: self.llm_api_key.clone(),
            ..Default::default()
        }
    }
}
