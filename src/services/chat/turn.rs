//! Turn Driver
//!
//! Runs one conversation turn against the completion backend: streams each
//! round, dispatches the tool calls it asks for, feeds the results back,
//! and persists the final assistant message. Runs detached from the view;
//! if nobody is listening any more the chunks are simply not delivered.

use std::sync::Arc;

use ragdesk_core::{ChatMessage, SessionChunk, StreamEvent, ToolCall, ToolDefinition};
use ragdesk_llm::{LlmProvider, StopReason};
use ragdesk_tools::ToolDispatcher;
use tokio::sync::mpsc;

use crate::storage::SessionStore;

const ROUND_SEPARATOR: &str = "\n\n";

pub(crate) struct TurnRequest {
    pub session_id: String,
    pub model: String,
    /// Transcript including the new user message
    pub context: Vec<ChatMessage>,
    pub tools: Vec<ToolDefinition>,
    /// Append the final assistant message to the store
    pub persist: bool,
}

/// What the driver produced
#[derive(Debug)]
pub(crate) struct TurnOutput {
    pub message: ChatMessage,
    /// The message reached the store
    pub persisted: bool,
    /// It should have, but the append failed
    pub unsaved: bool,
    pub error: Option<String>,
}

pub(crate) struct TurnDriver {
    pub backend: Arc<dyn LlmProvider>,
    pub dispatcher: Arc<ToolDispatcher>,
    pub store: Arc<dyn SessionStore>,
    pub max_tool_rounds: u32,
}

impl TurnDriver {
    pub async fn run(self, request: TurnRequest, chunks: mpsc::Sender<SessionChunk>) -> TurnOutput {
        let TurnRequest {
            session_id,
            model,
            mut context,
            tools,
            persist,
        } = request;
        let emit = |event: StreamEvent| {
            let chunks = chunks.clone();
            let session_id = session_id.clone();
            async move {
                // The consumer may have detached; that is not an error.
                let _ = chunks.send(SessionChunk::new(session_id, event)).await;
            }
        };

        let mut text = String::new();
        let mut tool_calls: Vec<ToolCall> = Vec::new();
        let mut error = None;
        let mut stop_reason = None;

        for round in 1..=self.max_tool_rounds {
            let (tx, mut rx) = mpsc::channel::<StreamEvent>(64);
            if !text.is_empty() && !text.ends_with(ROUND_SEPARATOR) {
                text.push_str(ROUND_SEPARATOR);
                emit(StreamEvent::TextDelta {
                    content: ROUND_SEPARATOR.to_string(),
                })
                .await;
            }

            let forward = async {
                while let Some(event) = rx.recv().await {
                    if !event.is_terminal() {
                        emit(event).await;
                    }
                }
            };
            let (response, ()) = tokio::join!(
                self.backend
                    .stream_message(&model, context.clone(), tools.clone(), tx),
                forward
            );

            let response = match response {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(session_id = %session_id, round, error = %e, "Completion request failed");
                    emit(StreamEvent::Error {
                        message: e.to_string(),
                        code: None,
                    })
                    .await;
                    error = Some(e.to_string());
                    break;
                }
            };

            text.push_str(&response.content);
            stop_reason = Some(response.stop_reason.clone());
            if !response.has_tool_calls() {
                break;
            }

            tracing::debug!(
                session_id = %session_id,
                round,
                tool_count = response.tool_calls.len(),
                "Dispatching tool calls"
            );
            let executed = self
                .dispatcher
                .execute_batch(Some(&session_id), response.tool_calls)
                .await;
            for call in &executed {
                emit(StreamEvent::ToolExecuted { call: call.clone() }).await;
            }
            context.push(ChatMessage::assistant(response.content).with_tool_calls(executed.clone()));
            tool_calls.extend(executed);

            if round == self.max_tool_rounds {
                tracing::warn!(session_id = %session_id, rounds = round, "Tool round limit reached");
            }
        }

        // Drop the separator if the last round produced no text
        if text.ends_with(ROUND_SEPARATOR) {
            text.truncate(text.len() - ROUND_SEPARATOR.len());
        }
        if text.is_empty() {
            if let Some(e) = &error {
                text = format!("Sorry, I couldn't complete that request: {}", e);
            }
        }
        let message = ChatMessage::assistant(text).with_tool_calls(tool_calls);

        let mut persisted = false;
        if persist {
            match self.store.append_message(&session_id, message.clone()).await {
                Ok(()) => persisted = true,
                Err(e) => {
                    tracing::warn!(session_id = %session_id, error = %e, "Failed to persist assistant message");
                }
            }
        }

        emit(StreamEvent::Complete {
            stop_reason: stop_reason.map(|r| stop_reason_label(&r)),
        })
        .await;

        TurnOutput {
            message,
            persisted,
            unsaved: persist && !persisted,
            error,
        }
    }
}

fn stop_reason_label(reason: &StopReason) -> String {
    match reason {
        StopReason::EndTurn => "end_turn".to_string(),
        StopReason::ToolUse => "tool_use".to_string(),
        StopReason::MaxTokens => "max_tokens".to_string(),
        StopReason::Other(other) => other.clone(),
    }
}
