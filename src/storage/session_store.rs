//! Session Store Contract
//!
//! Durable session list and transcript persistence as the chat orchestrator
//! sees it. Each call is an independent atomic operation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ragdesk_core::ChatMessage;
use serde::{Deserialize, Serialize};

use crate::models::session::SessionInfo;
use crate::utils::error::AppResult;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// All saved sessions, newest first
    async fn list_sessions(&self) -> AppResult<Vec<SessionInfo>>;

    /// Transcript of a saved session. `NotFound` if it does not exist.
    async fn get_messages(&self, session_id: &str) -> AppResult<Vec<ChatMessage>>;

    /// Create a session record with an empty transcript.
    ///
    /// Creating an id that already exists leaves the record untouched and
    /// returns it.
    async fn create_session(
        &self,
        title: &str,
        session_id: &str,
        first_message: Option<&str>,
    ) -> AppResult<SessionInfo>;

    async fn delete_session(&self, session_id: &str) -> AppResult<()>;

    /// Empty the transcript, keeping the record and title
    async fn clear_messages(&self, session_id: &str) -> AppResult<()>;

    /// Append a finalized message. `NotFound` if the session does not exist.
    async fn append_message(&self, session_id: &str, message: ChatMessage) -> AppResult<()>;
}

/// One saved session: its listing entry plus transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(flatten)]
    pub info: SessionInfo,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl SessionRecord {
    pub fn new(session_id: &str, title: &str, first_message: Option<&str>, created_at: DateTime<Utc>) -> Self {
        Self {
            info: SessionInfo {
                id: session_id.to_string(),
                title: title.to_string(),
                created_at,
                preview: first_message.map(str::to_string),
            },
            messages: Vec::new(),
        }
    }
}

/// Newest first, id as tie-breaker so the order is stable
pub(crate) fn sort_newest_first(sessions: &mut [SessionInfo]) {
    sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
}
