//! Chat State
//!
//! Transient, per-active-session view state. Never persisted.

use ragdesk_core::{ChatMessage, ToolCall};
use serde::Serialize;

/// Where the active session is in its turn lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    Idle,
    /// User message appended, request being sent
    Submitting,
    /// Chunks arriving, tool calls may be running
    Streaming,
    /// Buffer being folded into the final assistant message
    Finalizing,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatState {
    pub session_id: String,
    pub messages: Vec<ChatMessage>,
    /// True from submission until finalization
    pub is_processing: bool,
    pub model: String,
    /// Assistant text streamed so far in the current turn
    pub streaming_buffer: String,
    /// Tool calls completed so far in the current turn
    pub pending_tool_calls: Vec<ToolCall>,
    /// The session has a record in the store
    pub persisted: bool,
    pub phase: TurnPhase,
    /// Bumped on every submit and every session change; a turn whose
    /// number no longer matches has been detached from the view.
    #[serde(skip)]
    pub(crate) turn: u64,
}

impl ChatState {
    pub fn new(session_id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
            is_processing: false,
            model: model.into(),
            streaming_buffer: String::new(),
            pending_tool_calls: Vec::new(),
            persisted: false,
            phase: TurnPhase::Idle,
            turn: 0,
        }
    }

    /// Has messages that exist nowhere but here
    pub fn is_dirty(&self) -> bool {
        !self.persisted && !self.messages.is_empty()
    }

    /// Point the view at another session, dropping all transient state.
    /// The model selection is kept.
    pub(crate) fn reset_for(&mut self, session_id: impl Into<String>) {
        self.session_id = session_id.into();
        self.messages.clear();
        self.persisted = false;
        self.finish_turn();
        self.turn += 1;
    }

    pub(crate) fn begin_turn(&mut self, user_message: ChatMessage) -> u64 {
        self.messages.push(user_message);
        self.is_processing = true;
        self.phase = TurnPhase::Submitting;
        self.streaming_buffer.clear();
        self.pending_tool_calls.clear();
        self.turn += 1;
        self.turn
    }

    /// Whether chunks for `session_id` from turn `turn` still belong on screen
    pub(crate) fn owns(&self, session_id: &str, turn: u64) -> bool {
        self.session_id == session_id && self.turn == turn
    }

    pub(crate) fn finish_turn(&mut self) {
        self.is_processing = false;
        self.phase = TurnPhase::Idle;
        self.streaming_buffer.clear();
        self.pending_tool_calls.clear();
    }
}
