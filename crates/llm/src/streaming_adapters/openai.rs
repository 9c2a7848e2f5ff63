//! OpenAI-Compatible SSE Adapter
//!
//! Handles the `chat/completions` SSE format, including parallel tool calls
//! whose argument fragments arrive interleaved and keyed by index.

use std::collections::BTreeMap;

use ragdesk_core::streaming::{AdapterError, StreamAdapter, StreamEvent};
use serde::Deserialize;

/// Internal event types from the SSE payload
#[derive(Debug, Deserialize)]
struct OpenAIEvent {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Option<Delta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallDelta>>,
}

#[derive(Debug, Deserialize)]
struct ToolCallDelta {
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<FunctionDelta>,
}

#[derive(Debug, Deserialize)]
struct FunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

#[derive(Debug, Default)]
struct PendingToolCall {
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

/// Adapter for OpenAI-compatible SSE streams
#[derive(Debug, Default)]
pub struct OpenAiSseAdapter {
    /// Tool calls being accumulated, keyed by their stream index
    pending: BTreeMap<usize, PendingToolCall>,
    /// Index used for deltas that omit `index`
    last_index: usize,
}

impl OpenAiSseAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit every accumulated tool call in index order.
    fn flush_pending_tools(&mut self) -> Vec<StreamEvent> {
        std::mem::take(&mut self.pending)
            .into_iter()
            .filter_map(|(index, call)| {
                let name = call.name?;
                Some(StreamEvent::ToolCallRequest {
                    tool_id: call.id.unwrap_or_else(|| format!("call_{}", index)),
                    tool_name: name,
                    arguments: call.arguments,
                })
            })
            .collect()
    }
}

impl StreamAdapter for OpenAiSseAdapter {
    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn adapt(&mut self, input: &str) -> Result<Vec<StreamEvent>, AdapterError> {
        let trimmed = input.trim();

        // SSE comments and keep-alives
        if trimmed.is_empty() || trimmed.starts_with(':') {
            return Ok(vec![]);
        }

        let json_str = match trimmed.strip_prefix("data:") {
            Some(rest) => rest.trim_start(),
            None if trimmed.starts_with("event:") || trimmed.starts_with("id:") => {
                return Ok(vec![]);
            }
            None => trimmed,
        };

        if json_str.is_empty() {
            return Ok(vec![]);
        }

        if json_str == "[DONE]" {
            return Ok(self.flush_pending_tools());
        }

        let event: OpenAIEvent =
            serde_json::from_str(json_str).map_err(|e| AdapterError::ParseError(e.to_string()))?;

        let mut events = vec![];

        for choice in event.choices {
            if let Some(delta) = choice.delta {
                if let Some(content) = delta.content {
                    if !content.is_empty() {
                        events.push(StreamEvent::TextDelta { content });
                    }
                }

                for tc in delta.tool_calls.unwrap_or_default() {
                    let index = tc.index.unwrap_or(self.last_index);
                    self.last_index = index;
                    let entry = self.pending.entry(index).or_default();
                    if let Some(id) = tc.id {
                        entry.id = Some(id);
                    }
                    if let Some(func) = tc.function {
                        if let Some(name) = func.name {
                            entry.name = Some(name);
                        }
                        if let Some(args) = func.arguments {
                            entry.arguments.push_str(&args);
                        }
                    }
                }
            }

            if let Some(finish_reason) = choice.finish_reason {
                events.extend(self.flush_pending_tools());
                events.push(StreamEvent::Complete {
                    stop_reason: Some(finish_reason),
                });
            }
        }

        Ok(events)
    }

    fn reset(&mut self) {
        self.pending.clear();
        self.last_index = 0;
    }
}
