//! OpenAI-Compatible Provider
//!
//! Implementation of the LlmProvider trait for any endpoint speaking the
//! OpenAI `chat/completions` streaming protocol (OpenAI, AI gateways,
//! local inference servers).

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use ragdesk_core::message::{ChatMessage, MessageRole};
use ragdesk_core::streaming::{StreamAdapter, StreamEvent};
use ragdesk_core::tool_trait::ToolDefinition;

use super::provider::{parse_http_error, LlmProvider};
use super::types::{LlmError, LlmResponse, LlmResult, ProviderConfig, StopReason, ToolCallRequest};
use crate::http_client::{build_http_client, DEFAULT_USER_AGENT};
use crate::streaming_adapters::OpenAiSseAdapter;

/// OpenAI-compatible streaming provider
pub struct OpenAiCompatibleProvider {
    config: ProviderConfig,
    client: reqwest::Client,
    endpoint: url::Url,
}

impl OpenAiCompatibleProvider {
    /// Create a provider; fails if `base_url` is not a valid URL.
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let endpoint = chat_completions_url(&config.base_url)?;
        let client = build_http_client(
            DEFAULT_USER_AGENT,
            Some(Duration::from_secs(config.timeout_secs)),
        );
        Ok(Self {
            config,
            client,
            endpoint,
        })
    }

    /// Full URL requests are posted to
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Build the request body for the API
    fn build_request_body(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Value {
        let mut body = json!({
            "model": model,
            "messages": messages_to_openai(messages),
            "stream": true,
        });

        if !tools.is_empty() {
            let openai_tools: Vec<Value> = tools.iter().map(|t| t.to_openai_format()).collect();
            body["tools"] = json!(openai_tools);
        }

        body
    }
}

/// Resolve `<base>/chat/completions`, accepting a base that already ends with it.
fn chat_completions_url(base_url: &str) -> LlmResult<url::Url> {
    let trimmed = base_url.trim().trim_end_matches('/');
    let full = if trimmed.ends_with("/chat/completions") {
        trimmed.to_string()
    } else {
        format!("{}/chat/completions", trimmed)
    };
    url::Url::parse(&full).map_err(|e| LlmError::InvalidRequest {
        message: format!("Invalid base URL '{}': {}", base_url, e),
    })
}

/// Convert transcript messages to OpenAI chat messages.
///
/// An assistant message carrying tool calls expands into the assistant
/// `tool_calls` entry, one `tool` message per result, then its text.
fn messages_to_openai(messages: &[ChatMessage]) -> Vec<Value> {
    let mut out = Vec::with_capacity(messages.len());
    for msg in messages {
        if msg.role != MessageRole::Assistant || msg.tool_calls.is_empty() {
            out.push(json!({
                "role": msg.role.to_string(),
                "content": msg.content,
            }));
            continue;
        }

        let calls: Vec<Value> = msg
            .tool_calls
            .iter()
            .map(|call| {
                json!({
                    "id": call.id,
                    "type": "function",
                    "function": {
                        "name": call.name,
                        "arguments": call.arguments.to_string(),
                    }
                })
            })
            .collect();
        out.push(json!({
            "role": "assistant",
            "content": Value::Null,
            "tool_calls": calls,
        }));
        for call in &msg.tool_calls {
            out.push(json!({
                "role": "tool",
                "tool_call_id": call.id,
                "content": call.result.to_content(),
            }));
        }
        if !msg.content.is_empty() {
            out.push(json!({
                "role": "assistant",
                "content": msg.content,
            }));
        }
    }
    out
}

/// Parse streamed argument text; malformed JSON becomes an empty object so the
/// tool reports its own validation failure.
fn parse_tool_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Model produced malformed tool arguments");
        json!({})
    })
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &'static str {
        "openai-compatible"
    }

    async fn stream_message(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        tools: Vec<ToolDefinition>,
        tx: mpsc::Sender<StreamEvent>,
    ) -> LlmResult<LlmResponse> {
        let body = self.build_request_body(model, &messages, &tools);

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(api_key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| LlmError::NetworkError {
            message: e.to_string(),
        })?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body_text = response.text().await.map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;
            return Err(parse_http_error(status, &body_text, self.name()));
        }

        // Process SSE stream
        let mut adapter = OpenAiSseAdapter::new();
        let mut accumulated_content = String::new();
        let mut tool_calls = Vec::new();
        let mut stop_reason = StopReason::EndTurn;

        let mut stream = response.bytes_stream();
        // Raw bytes; a UTF-8 sequence may straddle two reads
        let mut buffer: Vec<u8> = Vec::new();
        let mut finished = false;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;

            buffer.extend_from_slice(&chunk);

            // Decode complete lines only
            while let Some(line_end) = buffer.iter().position(|&b| b == b'\n') {
                let raw: Vec<u8> = buffer.drain(..=line_end).collect();
                let line = String::from_utf8_lossy(&raw[..line_end]).into_owned();

                if line.trim().is_empty() {
                    continue;
                }
                if line.trim() == "data: [DONE]" {
                    finished = true;
                }

                let events = match adapter.adapt(&line) {
                    Ok(events) => events,
                    Err(e) => {
                        let _ = tx
                            .send(StreamEvent::Error {
                                message: e.to_string(),
                                code: None,
                            })
                            .await;
                        continue;
                    }
                };

                for event in events {
                    match &event {
                        StreamEvent::TextDelta { content } => {
                            accumulated_content.push_str(content);
                        }
                        StreamEvent::ToolCallRequest {
                            tool_id,
                            tool_name,
                            arguments,
                        } => {
                            tool_calls.push(ToolCallRequest {
                                id: tool_id.clone(),
                                name: tool_name.clone(),
                                arguments: parse_tool_arguments(arguments),
                            });
                        }
                        StreamEvent::Complete {
                            stop_reason: Some(reason),
                        } => {
                            stop_reason = StopReason::from(reason.as_str());
                        }
                        _ => {}
                    }

                    // The caller emits its own completion after running tools
                    if !event.is_terminal() {
                        let _ = tx.send(event).await;
                    }
                }
            }
        }

        // Servers that close without [DONE] may leave tool calls pending
        if !finished {
            if let Ok(events) = adapter.adapt("data: [DONE]") {
                for event in events {
                    if let StreamEvent::ToolCallRequest {
                        tool_id,
                        tool_name,
                        arguments,
                    } = &event
                    {
                        tool_calls.push(ToolCallRequest {
                            id: tool_id.clone(),
                            name: tool_name.clone(),
                            arguments: parse_tool_arguments(arguments),
                        });
                    }
                    let _ = tx.send(event).await;
                }
            }
        }

        if !tool_calls.is_empty() && stop_reason == StopReason::EndTurn {
            stop_reason = StopReason::ToolUse;
        }

        tracing::debug!(
            provider = self.name(),
            model,
            chars = accumulated_content.len(),
            tool_calls = tool_calls.len(),
            "Completion round finished"
        );

        Ok(LlmResponse {
            content: accumulated_content,
            tool_calls,
            stop_reason,
        })
    }
}
