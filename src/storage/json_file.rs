//! JSON File Session Store
//!
//! One pretty-printed JSON file per session under a directory
//! (default ~/.ragdesk/sessions/). Writes go through a temp file and a
//! rename so a crash never leaves a half-written transcript.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use ragdesk_core::ChatMessage;
use tokio::sync::Mutex;

use crate::models::session::SessionInfo;
use crate::storage::session_store::{sort_newest_first, SessionRecord, SessionStore};
use crate::utils::error::{AppError, AppResult};

const MAX_SESSION_ID_LEN: usize = 128;

pub struct JsonFileSessionStore {
    dir: PathBuf,
    /// Serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl JsonFileSessionStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub async fn open(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        tracing::debug!(dir = %dir.display(), "Opened session store");
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, session_id: &str) -> AppResult<PathBuf> {
        validate_session_id(session_id)?;
        Ok(self.dir.join(format!("{}.json", session_id)))
    }

    async fn read_record(&self, session_id: &str) -> AppResult<SessionRecord> {
        let path = self.record_path(session_id)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::not_found(format!("Session {}", session_id)));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    async fn write_record(&self, record: &SessionRecord) -> AppResult<()> {
        let path = self.record_path(&record.info.id)?;
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(record)?;
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

/// Ids become file names, so only a conservative character set is allowed.
fn validate_session_id(session_id: &str) -> AppResult<()> {
    let valid = !session_id.is_empty()
        && session_id.len() <= MAX_SESSION_ID_LEN
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::validation(format!("Invalid session id: {:?}", session_id)))
    }
}

#[async_trait]
impl SessionStore for JsonFileSessionStore {
    async fn list_sessions(&self) -> AppResult<Vec<SessionInfo>> {
        let mut sessions = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = tokio::fs::read_to_string(&path)
                .await
                .map_err(AppError::from)
                .and_then(|content| serde_json::from_str::<SessionRecord>(&content).map_err(AppError::from));
            match parsed {
                Ok(record) => sessions.push(record.info),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable session file");
                }
            }
        }
        sort_newest_first(&mut sessions);
        Ok(sessions)
    }

    async fn get_messages(&self, session_id: &str) -> AppResult<Vec<ChatMessage>> {
        Ok(self.read_record(session_id).await?.messages)
    }

    async fn create_session(
        &self,
        title: &str,
        session_id: &str,
        first_message: Option<&str>,
    ) -> AppResult<SessionInfo> {
        let _guard = self.write_lock.lock().await;
        match self.read_record(session_id).await {
            Ok(existing) => return Ok(existing.info),
            Err(AppError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
        let record = SessionRecord::new(session_id, title, first_message, Utc::now());
        self.write_record(&record).await?;
        tracing::info!(session_id, title, "Created session");
        Ok(record.info)
    }

    async fn delete_session(&self, session_id: &str) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.record_path(session_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::not_found(format!("Session {}", session_id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn clear_messages(&self, session_id: &str) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut record = self.read_record(session_id).await?;
        record.messages.clear();
        self.write_record(&record).await
    }

    async fn append_message(&self, session_id: &str, message: ChatMessage) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut record = self.read_record(session_id).await?;
        record.messages.push(message);
        self.write_record(&record).await
    }
}
