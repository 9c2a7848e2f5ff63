//! Tool Definitions and Results
//!
//! The shapes every tool source agrees on:
//!
//! - `ToolDefinition` - name, description and JSON schema offered to the completion backend
//! - `ToolResult` - the single outcome of one tool invocation
//! - `WeatherReport` - structured payload returned by the built-in weather tool
//!
//! Built-in tools, externally registered tools and the completion backend all
//! exchange these types, so they live in the dependency-free core crate.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// ToolDefinition
// ============================================================================

/// Declares what a tool accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool name (e.g., "web_search")
    pub name: String,
    /// Human-readable description shown to the model
    pub description: String,
    /// JSON-schema-like object describing the arguments
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Render in the OpenAI function-calling shape:
    /// `{type: "function", function: {name, description, parameters}}`.
    pub fn to_openai_format(&self) -> Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

// ============================================================================
// ToolResult
// ============================================================================

/// Synthetic weather reading produced by `get_weather`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub location: String,
    /// Whole degrees Celsius
    pub temperature: i32,
    pub condition: String,
    /// Relative humidity percentage
    pub humidity: u32,
}

/// Outcome of a single tool invocation.
///
/// Exactly one variant per invocation, never both content and error.
/// Serialized untagged so the wire shapes are `{content}`, the weather
/// fields, or `{error}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolResult {
    Success { content: String },
    Weather(WeatherReport),
    Failure { error: String },
}

impl ToolResult {
    /// Create a successful text result
    pub fn success(content: impl Into<String>) -> Self {
        Self::Success {
            content: content.into(),
        }
    }

    /// Create a failed result
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// Error message, if this is a failure
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failure { error } => Some(error),
            _ => None,
        }
    }

    /// Text handed back to the model as the tool's output.
    pub fn to_content(&self) -> String {
        match self {
            Self::Success { content } => content.clone(),
            Self::Weather(report) => serde_json::to_string(report).unwrap_or_default(),
            Self::Failure { error } => format!("Error: {}", error),
        }
    }
}
