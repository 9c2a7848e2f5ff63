//! LLM Provider Trait
//!
//! Defines the contract the chat orchestrator uses to call a completion backend.

use async_trait::async_trait;
use tokio::sync::mpsc;

use ragdesk_core::message::ChatMessage;
use ragdesk_core::streaming::StreamEvent;
use ragdesk_core::tool_trait::ToolDefinition;

use super::types::{LlmError, LlmResponse, LlmResult};

/// Trait that all completion backends must implement.
///
/// A backend receives the transcript, the model id and the tool definitions
/// offered for this turn. It pushes `StreamEvent`s through `tx` as output
/// arrives and returns the assembled response once the round ends. Tool calls
/// the model requested are reported in `LlmResponse::tool_calls`; executing
/// them is the caller's job.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Returns the provider name for identification.
    fn name(&self) -> &'static str;

    /// Stream one completion round.
    ///
    /// Assistant messages in `messages` may carry tool calls with results from
    /// earlier rounds of the same turn; providers must replay them in their
    /// native tool-result format.
    async fn stream_message(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        tools: Vec<ToolDefinition>,
        tx: mpsc::Sender<StreamEvent>,
    ) -> LlmResult<LlmResponse>;
}

/// Helper function to parse HTTP error status codes
pub fn parse_http_error(status: u16, body: &str, provider: &str) -> LlmError {
    match status {
        401 => LlmError::AuthenticationFailed {
            message: format!("{}: Invalid API key", provider),
        },
        403 => LlmError::AuthenticationFailed {
            message: format!("{}: Access denied", provider),
        },
        404 => LlmError::ModelNotFound {
            model: body.to_string(),
        },
        429 => LlmError::RateLimited {
            message: body.to_string(),
        },
        400 => LlmError::InvalidRequest {
            message: body.to_string(),
        },
        500..=599 => LlmError::ServerError {
            message: body.to_string(),
            status,
        },
        _ => LlmError::Other {
            message: format!("HTTP {}: {}", status, body),
        },
    }
}
