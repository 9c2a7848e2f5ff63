//! In-memory session store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use ragdesk_core::ChatMessage;
use tokio::sync::RwLock;

use crate::models::session::SessionInfo;
use crate::storage::session_store::{sort_newest_first, SessionRecord, SessionStore};
use crate::utils::error::{AppError, AppResult};

/// Session store backed by a map; contents vanish with the process.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn list_sessions(&self) -> AppResult<Vec<SessionInfo>> {
        let sessions = self.sessions.read().await;
        let mut list: Vec<SessionInfo> = sessions.values().map(|r| r.info.clone()).collect();
        sort_newest_first(&mut list);
        Ok(list)
    }

    async fn get_messages(&self, session_id: &str) -> AppResult<Vec<ChatMessage>> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|r| r.messages.clone())
            .ok_or_else(|| AppError::not_found(format!("Session {}", session_id)))
    }

    async fn create_session(
        &self,
        title: &str,
        session_id: &str,
        first_message: Option<&str>,
    ) -> AppResult<SessionInfo> {
        let mut sessions = self.sessions.write().await;
        let record = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionRecord::new(session_id, title, first_message, Utc::now()));
        Ok(record.info.clone())
    }

    async fn delete_session(&self, session_id: &str) -> AppResult<()> {
        self.sessions
            .write()
            .await
            .remove(session_id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found(format!("Session {}", session_id)))
    }

    async fn clear_messages(&self, session_id: &str) -> AppResult<()> {
        let mut sessions = self.sessions.write().await;
        let record = sessions
            .get_mut(session_id)
            .ok_or_else(|| AppError::not_found(format!("Session {}", session_id)))?;
        record.messages.clear();
        Ok(())
    }

    async fn append_message(&self, session_id: &str, message: ChatMessage) -> AppResult<()> {
        let mut sessions = self.sessions.write().await;
        let record = sessions
            .get_mut(session_id)
            .ok_or_else(|| AppError::not_found(format!("Session {}", session_id)))?;
        record.messages.push(message);
        Ok(())
    }
}
