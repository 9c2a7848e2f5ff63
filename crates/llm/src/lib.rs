//! Ragdesk LLM
//!
//! The completion backend contract used by the chat orchestrator, plus an
//! implementation for OpenAI-compatible streaming endpoints.
//!
//! Also includes the SSE streaming adapter and the HTTP client factory
//! shared with the tool providers.

pub mod http_client;
pub mod openai;
pub mod provider;
pub mod streaming_adapters;
pub mod types;

// Re-export main types
pub use http_client::{build_http_client, build_manual_redirect_client, DEFAULT_USER_AGENT};
pub use openai::OpenAiCompatibleProvider;
pub use provider::{parse_http_error, LlmProvider};
pub use types::*;

// Re-export streaming adapters
pub use streaming_adapters::OpenAiSseAdapter;
