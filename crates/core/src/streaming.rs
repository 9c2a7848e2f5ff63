//! Stream Event Types
//!
//! Provider-agnostic event types and adapter trait for processing streamed
//! completion output. The LLM crate produces these events; the application
//! crate tags them with the session that started the turn.

use serde::{Deserialize, Serialize};

use crate::message::ToolCall;

/// Streaming event that all provider adapters convert to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Text content delta from the model
    TextDelta { content: String },

    /// The model asked for a tool; arguments are the raw JSON string
    ToolCallRequest {
        tool_id: String,
        tool_name: String,
        arguments: String,
    },

    /// A requested tool finished (success or failure)
    ToolExecuted { call: ToolCall },

    /// Error during streaming
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },

    /// Stream complete
    Complete {
        #[serde(skip_serializing_if = "Option::is_none")]
        stop_reason: Option<String>,
    },
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Complete { .. })
    }
}

/// A stream event addressed to the session whose turn produced it.
///
/// Consumers compare `session_id` with the session they display and drop
/// the chunk on mismatch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionChunk {
    pub session_id: String,
    pub event: StreamEvent,
}

impl SessionChunk {
    pub fn new(session_id: impl Into<String>, event: StreamEvent) -> Self {
        Self {
            session_id: session_id.into(),
            event,
        }
    }
}

/// Errors that can occur during stream adaptation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum AdapterError {
    /// Invalid format that couldn't be parsed
    InvalidFormat(String),
    /// JSON/data parsing error
    ParseError(String),
}

impl std::fmt::Display for AdapterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdapterError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            AdapterError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for AdapterError {}

/// Trait for adapting provider-specific stream formats to `StreamEvent`s.
pub trait StreamAdapter: Send + Sync {
    /// Returns the provider name for logging and identification.
    fn provider_name(&self) -> &'static str;

    /// Adapt a raw stream line/chunk to events.
    ///
    /// A single input line may produce zero, one, or multiple events.
    fn adapt(&mut self, input: &str) -> Result<Vec<StreamEvent>, AdapterError>;

    /// Reset adapter state for a new stream.
    fn reset(&mut self) {
        // Default implementation does nothing
    }
}
