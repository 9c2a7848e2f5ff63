//! Shared fixtures: a scripted completion backend and a store that logs
//! every call.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ragdesk::models::session::SessionInfo;
use ragdesk::services::chat::{ChatOrchestrator, OrchestratorSettings};
use ragdesk::storage::{InMemorySessionStore, SessionStore};
use ragdesk::utils::error::{AppError, AppResult};
use ragdesk_core::{ChatMessage, MessageRole, StreamEvent, ToolDefinition};
use ragdesk_llm::{LlmError, LlmProvider, LlmResponse, LlmResult, StopReason, ToolCallRequest};
use ragdesk_tools::{EmptyToolRegistry, ToolDispatcher, ToolsConfig};
use tokio::sync::{mpsc, Notify};

pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// One scripted completion round
pub enum Round {
    Reply {
        deltas: Vec<&'static str>,
        tool_calls: Vec<ToolCallRequest>,
    },
    Fail(LlmError),
}

impl Round {
    pub fn text(deltas: &[&'static str]) -> Self {
        Round::Reply {
            deltas: deltas.to_vec(),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool(name: &str, arguments: serde_json::Value) -> Self {
        Round::Reply {
            deltas: Vec::new(),
            tool_calls: vec![ToolCallRequest {
                id: format!("call_{}", name),
                name: name.to_string(),
                arguments,
            }],
        }
    }
}

/// Completion backend that plays back scripted rounds.
pub struct ScriptedBackend {
    rounds: Mutex<VecDeque<Round>>,
    /// Transcript and tool names seen by each call
    pub requests: Mutex<Vec<(Vec<ChatMessage>, Vec<String>)>>,
    log: CallLog,
    /// When set, each round pauses after its first delta until notified
    gate: Option<Arc<Notify>>,
}

impl ScriptedBackend {
    pub fn new(rounds: Vec<Round>, log: CallLog) -> Self {
        Self {
            rounds: Mutex::new(rounds.into()),
            requests: Mutex::new(Vec::new()),
            log,
            gate: None,
        }
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn stream_message(
        &self,
        _model: &str,
        messages: Vec<ChatMessage>,
        tools: Vec<ToolDefinition>,
        tx: mpsc::Sender<StreamEvent>,
    ) -> LlmResult<LlmResponse> {
        self.log.lock().unwrap().push("backend".to_string());
        self.requests
            .lock()
            .unwrap()
            .push((messages, tools.into_iter().map(|t| t.name).collect()));

        let round = self.rounds.lock().unwrap().pop_front();
        let (deltas, tool_calls) = match round {
            Some(Round::Reply { deltas, tool_calls }) => (deltas, tool_calls),
            Some(Round::Fail(e)) => return Err(e),
            None => (Vec::new(), Vec::new()),
        };

        for (i, delta) in deltas.iter().enumerate() {
            let _ = tx
                .send(StreamEvent::TextDelta {
                    content: delta.to_string(),
                })
                .await;
            if i == 0 {
                if let Some(gate) = &self.gate {
                    gate.notified().await;
                }
            }
        }
        let _ = tx.send(StreamEvent::Complete { stop_reason: None }).await;

        let stop_reason = if tool_calls.is_empty() {
            StopReason::EndTurn
        } else {
            StopReason::ToolUse
        };
        Ok(LlmResponse {
            content: deltas.concat(),
            tool_calls,
            stop_reason,
        })
    }
}

/// In-memory store that logs each call and can be told to misbehave.
pub struct RecordingStore {
    inner: InMemorySessionStore,
    log: CallLog,
    pub fail_creates: AtomicBool,
    /// Number of assistant-message appends still to fail
    pub fail_assistant_appends: AtomicUsize,
    /// Delay applied to every append, in milliseconds
    pub append_delay_ms: AtomicU64,
}

impl RecordingStore {
    pub fn new(log: CallLog) -> Self {
        Self {
            inner: InMemorySessionStore::new(),
            log,
            fail_creates: AtomicBool::new(false),
            fail_assistant_appends: AtomicUsize::new(0),
            append_delay_ms: AtomicU64::new(0),
        }
    }

    pub fn appends_to(&self, session_id: &str) -> usize {
        let entry = format!("append:{}", session_id);
        self.log.lock().unwrap().iter().filter(|e| **e == entry).count()
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl SessionStore for RecordingStore {
    async fn list_sessions(&self) -> AppResult<Vec<SessionInfo>> {
        self.record("list".to_string());
        self.inner.list_sessions().await
    }

    async fn get_messages(&self, session_id: &str) -> AppResult<Vec<ChatMessage>> {
        self.record(format!("get:{}", session_id));
        self.inner.get_messages(session_id).await
    }

    async fn create_session(
        &self,
        title: &str,
        session_id: &str,
        first_message: Option<&str>,
    ) -> AppResult<SessionInfo> {
        self.record(format!("create:{}", session_id));
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(AppError::store("disk full"));
        }
        self.inner.create_session(title, session_id, first_message).await
    }

    async fn delete_session(&self, session_id: &str) -> AppResult<()> {
        self.record(format!("delete:{}", session_id));
        self.inner.delete_session(session_id).await
    }

    async fn clear_messages(&self, session_id: &str) -> AppResult<()> {
        self.record(format!("clear:{}", session_id));
        self.inner.clear_messages(session_id).await
    }

    async fn append_message(&self, session_id: &str, message: ChatMessage) -> AppResult<()> {
        self.record(format!("append:{}", session_id));
        let delay = self.append_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if message.role == MessageRole::Assistant
            && self
                .fail_assistant_appends
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        {
            return Err(AppError::store("write failed"));
        }
        self.inner.append_message(session_id, message).await
    }
}

/// Dispatcher that never reaches the network: no search key, no webhook,
/// private hosts blocked.
pub fn offline_dispatcher() -> Arc<ToolDispatcher> {
    Arc::new(ToolDispatcher::from_config(
        &ToolsConfig::default(),
        Arc::new(EmptyToolRegistry),
    ))
}

pub fn orchestrator(
    backend: Arc<ScriptedBackend>,
    store: Arc<RecordingStore>,
) -> Arc<ChatOrchestrator> {
    Arc::new(ChatOrchestrator::new(
        backend,
        offline_dispatcher(),
        store,
        OrchestratorSettings::default(),
        "gpt-4o-mini",
    ))
}

/// Poll `check` until it holds or a second passes.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
