//! LLM Types
//!
//! Core types for completion backend interactions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Connection settings for an OpenAI-compatible backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    /// Bearer token; `None` for gateways that do not need one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            timeout_secs: default_request_timeout(),
        }
    }
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// Why the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    Other(String),
}

impl From<&str> for StopReason {
    fn from(reason: &str) -> Self {
        match reason {
            "stop" | "end_turn" => StopReason::EndTurn,
            "tool_calls" | "tool_use" | "function_call" => StopReason::ToolUse,
            "length" | "max_tokens" => StopReason::MaxTokens,
            other => StopReason::Other(other.to_string()),
        }
    }
}

/// Complete result of one streamed completion round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Concatenated text of all deltas
    pub content: String,
    /// Tool calls in the order the model emitted them
    pub tool_calls: Vec<ToolCallRequest>,
    pub stop_reason: StopReason,
}

impl LlmResponse {
    /// A text-only response
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
            stop_reason: StopReason::EndTurn,
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Errors from completion backends
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Authentication failed (invalid API key)
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// Rate limit exceeded
    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    /// Model not found or not available
    #[error("Model not found: {model}")]
    ModelNotFound { model: String },

    /// Invalid request (bad parameters)
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Server error from the provider
    #[error("Server error ({status}): {message}")]
    ServerError { message: String, status: u16 },

    /// Network/connection error
    #[error("Network error: {message}")]
    NetworkError { message: String },

    /// Response parsing error
    #[error("Parse error: {message}")]
    ParseError { message: String },

    /// Other error
    #[error("{message}")]
    Other { message: String },
}

/// Result type alias for completion backend calls
pub type LlmResult<T> = Result<T, LlmError>;
