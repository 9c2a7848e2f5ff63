//! Chat Orchestrator
//!
//! The session state machine between a front end, the completion backend,
//! the tool dispatcher and the session store.
//!
//! ## Turn lifecycle
//!
//! `Idle -> Submitting -> Streaming -> Finalizing -> Idle`, with
//! `is_processing` set for everything but `Idle`. One turn at a time: a
//! second `submit` while processing is rejected.
//!
//! ## Session lifecycle
//!
//! A session reaches the store either when its first message is submitted
//! (created before the completion request goes out) or by autosave when
//! the user starts a new session or switches away. Session changes detach
//! any in-flight turn from the view; its remaining chunks are dropped.
//!
//! Session-management failures never abort the operation that hit them.
//! They are broadcast as `ChatNotice`s.

use std::sync::Arc;

use ragdesk_core::{ChatMessage, MessageRole, SessionChunk, StreamEvent};
use ragdesk_llm::LlmProvider;
use ragdesk_tools::ToolDispatcher;
use tokio::sync::{broadcast, mpsc, RwLock};

use super::state::{ChatState, TurnPhase};
use super::title::generate_session_title;
use super::turn::{TurnDriver, TurnOutput, TurnRequest};
use crate::models::session::{model_display_name, ChatNotice, SessionInfo};
use crate::storage::SessionStore;
use crate::utils::error::AppError;

const NOTICE_CAPACITY: usize = 64;
const CHUNK_CAPACITY: usize = 128;

/// Tunables taken from `AppConfig`
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub max_tool_rounds: u32,
    pub session_title_max_len: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            max_tool_rounds: 5,
            session_title_max_len: 40,
        }
    }
}

/// Why a submit did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Empty or whitespace-only text
    Blank,
    /// A turn is already in flight
    Busy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Rejected(RejectReason),
    /// The turn finished; the final assistant message
    Finalized(ChatMessage),
    /// The view moved to another session before the turn finished
    Detached,
}

pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub struct ChatOrchestrator {
    backend: Arc<dyn LlmProvider>,
    dispatcher: Arc<ToolDispatcher>,
    store: Arc<dyn SessionStore>,
    settings: OrchestratorSettings,
    state: RwLock<ChatState>,
    sessions: RwLock<Vec<SessionInfo>>,
    notices: broadcast::Sender<ChatNotice>,
    /// Chunks that were applied to the view
    applied: broadcast::Sender<SessionChunk>,
}

impl ChatOrchestrator {
    pub fn new(
        backend: Arc<dyn LlmProvider>,
        dispatcher: Arc<ToolDispatcher>,
        store: Arc<dyn SessionStore>,
        settings: OrchestratorSettings,
        model: impl Into<String>,
    ) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        let (applied, _) = broadcast::channel(CHUNK_CAPACITY);
        Self {
            backend,
            dispatcher,
            store,
            settings,
            state: RwLock::new(ChatState::new(new_session_id(), model)),
            sessions: RwLock::new(Vec::new()),
            notices,
            applied,
        }
    }

    // ========================================================================
    // Read access
    // ========================================================================

    /// Snapshot of the active session's view state
    pub async fn state(&self) -> ChatState {
        self.state.read().await.clone()
    }

    /// Session list as last loaded from the store
    pub async fn sessions(&self) -> Vec<SessionInfo> {
        self.sessions.read().await.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatNotice> {
        self.notices.subscribe()
    }

    /// Live feed of the chunks applied to the active session's view
    pub fn subscribe_chunks(&self) -> broadcast::Receiver<SessionChunk> {
        self.applied.subscribe()
    }

    fn notify(&self, notice: ChatNotice) {
        // No subscribers is fine
        let _ = self.notices.send(notice);
    }

    /// Reload the session list from the store.
    pub async fn refresh_sessions(&self) {
        match self.store.list_sessions().await {
            Ok(list) => *self.sessions.write().await = list,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load session list");
                self.notify(ChatNotice::warning("Could not load sessions").with_detail(e.to_string()));
            }
        }
    }

    // ========================================================================
    // Turns
    // ========================================================================

    /// Submit a user message and drive the turn to completion.
    ///
    /// Returns once the turn is finalized, or as soon as the view has moved
    /// to another session (the turn itself keeps running in the background).
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Rejected(RejectReason::Blank);
        }

        let user_message = ChatMessage::user(text);
        let (session_id, turn, model, persisted, transcript) = {
            let mut state = self.state.write().await;
            if state.is_processing {
                tracing::debug!(session_id = %state.session_id, "Submit rejected: turn in flight");
                return SubmitOutcome::Rejected(RejectReason::Busy);
            }
            let turn = state.begin_turn(user_message.clone());
            let persisted = state.persisted;
            // Claimed up front so a concurrent autosave does not save it twice
            state.persisted = true;
            (
                state.session_id.clone(),
                turn,
                state.model.clone(),
                persisted,
                state.messages.clone(),
            )
        };
        tracing::info!(session_id = %session_id, model = %model, "Turn submitted");

        // The session must exist in the store before the request goes out.
        let persist = if persisted {
            if let Err(e) = self.store.append_message(&session_id, user_message).await {
                tracing::warn!(session_id = %session_id, error = %e, "Failed to persist user message");
                self.notify(ChatNotice::warning("Message not saved").with_detail(e.to_string()));
            }
            true
        } else {
            let saved = self.persist_transcript(&session_id, &transcript).await;
            if !saved {
                self.release_save_claim(&session_id).await;
            }
            saved
        };

        let tools = self.dispatcher.definitions().await;
        let (chunk_tx, mut chunk_rx) = mpsc::channel::<SessionChunk>(CHUNK_CAPACITY);
        let driver = TurnDriver {
            backend: Arc::clone(&self.backend),
            dispatcher: Arc::clone(&self.dispatcher),
            store: Arc::clone(&self.store),
            max_tool_rounds: self.settings.max_tool_rounds,
        };
        let request = TurnRequest {
            session_id: session_id.clone(),
            model,
            context: transcript,
            tools,
            persist,
        };
        let handle = tokio::spawn(driver.run(request, chunk_tx));

        {
            let mut state = self.state.write().await;
            if !state.owns(&session_id, turn) {
                return SubmitOutcome::Detached;
            }
            state.phase = TurnPhase::Streaming;
        }

        while let Some(chunk) = chunk_rx.recv().await {
            let mut state = self.state.write().await;
            if !state.owns(&chunk.session_id, turn) {
                tracing::warn!(
                    chunk_session = %chunk.session_id,
                    active_session = %state.session_id,
                    "Dropping chunk for a session no longer displayed"
                );
                return SubmitOutcome::Detached;
            }
            let _ = self.applied.send(chunk.clone());
            match chunk.event {
                StreamEvent::TextDelta { content } => state.streaming_buffer.push_str(&content),
                StreamEvent::ToolExecuted { call } => state.pending_tool_calls.push(call),
                StreamEvent::ToolCallRequest { .. } => {}
                StreamEvent::Error { message, .. } => {
                    self.notify(ChatNotice::error("The assistant ran into a problem").with_detail(message));
                }
                StreamEvent::Complete { .. } => state.phase = TurnPhase::Finalizing,
            }
        }

        let output = match handle.await {
            Ok(output) => output,
            Err(e) => {
                tracing::error!(session_id = %session_id, error = %e, "Turn task failed");
                self.notify(ChatNotice::error("The assistant ran into a problem").with_detail(e.to_string()));
                TurnOutput {
                    message: ChatMessage::assistant(format!("Sorry, I couldn't complete that request: {}", e)),
                    persisted: false,
                    unsaved: persist,
                    error: Some(e.to_string()),
                }
            }
        };

        self.finalize(&session_id, turn, output).await
    }

    async fn finalize(&self, session_id: &str, turn: u64, mut output: TurnOutput) -> SubmitOutcome {
        if output.unsaved {
            // One more attempt before telling the user
            match self.store.append_message(session_id, output.message.clone()).await {
                Ok(()) => output.persisted = true,
                Err(e) => {
                    tracing::warn!(session_id, error = %e, "Assistant reply not saved");
                    self.notify(ChatNotice::warning("Reply not saved").with_detail(e.to_string()));
                }
            }
        }

        let canonical = if output.persisted {
            match self.store.get_messages(session_id).await {
                Ok(messages) => Some(messages),
                Err(e) => {
                    tracing::warn!(session_id, error = %e, "Failed to reload transcript");
                    None
                }
            }
        } else {
            None
        };

        let mut state = self.state.write().await;
        if !state.owns(session_id, turn) {
            return SubmitOutcome::Detached;
        }
        match canonical {
            Some(messages) => state.messages = messages,
            None => state.messages.push(output.message.clone()),
        }
        state.finish_turn();
        tracing::info!(
            session_id,
            tool_calls = output.message.tool_calls.len(),
            failed = output.error.is_some(),
            "Turn finalized"
        );
        SubmitOutcome::Finalized(output.message)
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    /// Create the store record for `session_id` and write `messages` into it.
    /// Failures become a warning notice; returns whether it worked.
    async fn persist_transcript(&self, session_id: &str, messages: &[ChatMessage]) -> bool {
        let first_user = messages
            .iter()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str());
        let title = generate_session_title(first_user, self.settings.session_title_max_len);

        let result = async {
            self.store.create_session(&title, session_id, first_user).await?;
            for message in messages {
                self.store.append_message(session_id, message.clone()).await?;
            }
            Ok::<_, AppError>(())
        }
        .await;

        match result {
            Ok(()) => {
                tracing::info!(session_id, title = %title, "Session saved");
                self.notify(ChatNotice::success("Session saved").with_detail(title));
                self.refresh_sessions().await;
                true
            }
            Err(e) => {
                tracing::warn!(session_id, error = %e, "Failed to save session");
                self.notify(ChatNotice::warning("Failed to save session").with_detail(e.to_string()));
                false
            }
        }
    }

    /// Save the active session if it has messages but no store record.
    pub async fn autosave_if_dirty(&self) {
        let (session_id, messages) = {
            let mut state = self.state.write().await;
            if !state.is_dirty() {
                return;
            }
            state.persisted = true;
            (state.session_id.clone(), state.messages.clone())
        };
        if !self.persist_transcript(&session_id, &messages).await {
            self.release_save_claim(&session_id).await;
        }
    }

    /// Undo an optimistic `persisted` after a failed save, if the session is
    /// still on screen.
    async fn release_save_claim(&self, session_id: &str) {
        let mut state = self.state.write().await;
        if state.session_id == session_id {
            state.persisted = false;
        }
    }

    /// Start a fresh, empty session. Returns its id.
    pub async fn new_session(&self) -> String {
        self.autosave_if_dirty().await;
        let session_id = new_session_id();
        self.state.write().await.reset_for(session_id.clone());
        self.refresh_sessions().await;
        tracing::info!(session_id = %session_id, "New chat session");
        self.notify(ChatNotice::info("New chat session started."));
        session_id
    }

    /// Make `target_id` the active session. Returns false when it already was.
    pub async fn switch_session(&self, target_id: &str) -> bool {
        if self.state.read().await.session_id == target_id {
            return false;
        }

        self.autosave_if_dirty().await;
        self.state.write().await.reset_for(target_id);

        match self.store.get_messages(target_id).await {
            Ok(messages) => {
                let mut state = self.state.write().await;
                if state.session_id == target_id {
                    state.messages = messages;
                    state.persisted = true;
                }
            }
            Err(e) => {
                tracing::warn!(session_id = target_id, error = %e, "Failed to load session");
                self.notify(ChatNotice::warning("Could not load session").with_detail(e.to_string()));
            }
        }

        tracing::info!(session_id = target_id, "Switched session");
        self.notify(ChatNotice::info("Switched session."));
        true
    }

    /// Delete a session. Deleting the active one moves the view to a new
    /// empty session.
    pub async fn delete_session(&self, session_id: &str) {
        match self.store.delete_session(session_id).await {
            Ok(()) | Err(AppError::NotFound(_)) => {}
            Err(e) => {
                tracing::warn!(session_id, error = %e, "Failed to delete session");
                self.notify(ChatNotice::error("Failed to delete session").with_detail(e.to_string()));
                return;
            }
        }

        let was_active = {
            let mut state = self.state.write().await;
            let active = state.session_id == session_id;
            if active {
                // Nothing left to autosave
                state.messages.clear();
                state.persisted = false;
            }
            active
        };

        if was_active {
            self.new_session().await;
        } else {
            self.refresh_sessions().await;
        }
        tracing::info!(session_id, was_active, "Session deleted");
        self.notify(ChatNotice::success("Session deleted."));
    }

    /// Empty the active transcript, keeping the session record and title.
    pub async fn clear_messages(&self) {
        let (session_id, persisted) = {
            let state = self.state.read().await;
            (state.session_id.clone(), state.persisted)
        };

        if persisted {
            if let Err(e) = self.store.clear_messages(&session_id).await {
                tracing::warn!(session_id = %session_id, error = %e, "Failed to clear session");
                self.notify(ChatNotice::error("Failed to clear chat").with_detail(e.to_string()));
                return;
            }
        }

        {
            let mut state = self.state.write().await;
            if state.session_id == session_id {
                state.messages.clear();
                state.streaming_buffer.clear();
                state.pending_tool_calls.clear();
            }
        }
        self.notify(ChatNotice::success("Current chat cleared."));
    }

    /// Select the model for subsequent turns.
    pub async fn update_model(&self, model_id: &str) {
        self.state.write().await.model = model_id.to_string();
        tracing::info!(model = model_id, "Model updated");
        self.notify(ChatNotice::success(format!(
            "Model updated to {}",
            model_display_name(model_id)
        )));
    }
}
