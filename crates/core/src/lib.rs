//! Ragdesk Core
//!
//! Foundational data model, error types, and stream event types for the
//! Ragdesk workspace. This crate has no dependencies on HTTP clients,
//! completion backends, or storage.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `context` - Per-invocation tool context (`ToolContext`)
//! - `message` - Transcript messages and tool call records
//! - `tool_trait` - Tool definitions and results
//! - `streaming` - Stream event types, session tagging, and adapter trait

pub mod context;
pub mod error;
pub mod message;
pub mod streaming;
pub mod tool_trait;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Tool Context ───────────────────────────────────────────────────────
pub use context::ToolContext;

// ── Conversation Model ─────────────────────────────────────────────────
pub use message::{ChatMessage, MessageRole, ToolCall};

// ── Tool Definitions & Results ─────────────────────────────────────────
pub use tool_trait::{ToolDefinition, ToolResult, WeatherReport};

// ── Streaming Types ────────────────────────────────────────────────────
pub use streaming::{AdapterError, SessionChunk, StreamAdapter, StreamEvent};
