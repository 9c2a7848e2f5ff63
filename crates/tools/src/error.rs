//! Tool Errors
//!
//! Failures raised inside tool handlers and providers. None of these cross the
//! dispatcher boundary: `ToolDispatcher` renders every one of them into
//! `ToolResult::Failure` using the `Display` text below.

use ragdesk_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    /// Missing or malformed arguments
    #[error("{0}")]
    Validation(String),

    /// Page fetch failed (bad URL, HTTP status, content type, network)
    #[error("Failed to fetch: {0}")]
    Fetch(String),

    /// Workflow webhook answered with a non-2xx status
    #[error("N8N webhook failed with status {status}: {body}")]
    Webhook { status: u16, body: String },

    /// Transport-level HTTP failure
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The external tool registry reported an error
    #[error("{0}")]
    Registry(#[from] CoreError),

    /// A handler panicked while executing
    #[error("Tool '{tool}' panicked: {message}")]
    Panicked { tool: String, message: String },
}

impl ToolError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }
}

impl From<reqwest::Error> for ToolError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

impl From<ToolError> for String {
    fn from(err: ToolError) -> String {
        err.to_string()
    }
}
