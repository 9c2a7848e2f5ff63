//! Persistence Integration Tests
//!
//! Sessions written through the JSON file store survive a restart, and
//! application start-up lays out its config and session directories.

use std::sync::Arc;

use ragdesk::services::chat::{ChatOrchestrator, OrchestratorSettings, SubmitOutcome};
use ragdesk::storage::{JsonFileSessionStore, SessionStore};
use ragdesk::{AppConfig, AppState};
use tempfile::TempDir;

use crate::support::{new_log, offline_dispatcher, Round, ScriptedBackend};

async fn chat_over(dir: &TempDir, rounds: Vec<Round>) -> (Arc<ChatOrchestrator>, Arc<JsonFileSessionStore>) {
    let store = Arc::new(JsonFileSessionStore::open(dir.path()).await.unwrap());
    let backend = Arc::new(ScriptedBackend::new(rounds, new_log()));
    let chat = Arc::new(ChatOrchestrator::new(
        backend,
        offline_dispatcher(),
        store.clone(),
        OrchestratorSettings::default(),
        "gpt-4o-mini",
    ));
    chat.refresh_sessions().await;
    (chat, store)
}

#[tokio::test]
async fn test_session_survives_restart() {
    let dir = TempDir::new().unwrap();

    let session_id = {
        let (chat, _) = chat_over(&dir, vec![Round::text(&["Stored reply"])]).await;
        let outcome = chat.submit("Remember this conversation please").await;
        assert!(matches!(outcome, SubmitOutcome::Finalized(_)));
        chat.state().await.session_id
    };

    let (chat, store) = chat_over(&dir, Vec::new()).await;
    let sessions = chat.sessions().await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, session_id);
    assert_eq!(sessions[0].title, "Remember this conversation please");

    assert!(chat.switch_session(&session_id).await);
    let state = chat.state().await;
    assert_eq!(state.messages.len(), 2);
    assert_eq!(state.messages[1].content, "Stored reply");

    chat.delete_session(&session_id).await;
    assert!(store.list_sessions().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_long_first_message_truncates_title() {
    let dir = TempDir::new().unwrap();
    let (chat, _) = chat_over(&dir, vec![Round::text(&["ok"])]).await;

    chat.submit("Please summarize the quarterly revenue report for the board meeting")
        .await;

    let title = chat.sessions().await[0].title.clone();
    assert!(title.ends_with("..."));
    assert!(title.chars().count() <= 40);
    assert!(title.starts_with("Please summarize"));
}

#[tokio::test]
async fn test_initialize_creates_config_and_sessions_dir() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.json");
    let sessions_dir = dir.path().join("sessions");

    let config = AppConfig {
        sessions_dir: Some(sessions_dir.clone()),
        ..AppConfig::default()
    };
    std::fs::write(&config_path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

    let state = AppState::initialize(Some(config_path.clone())).await.unwrap();
    assert!(sessions_dir.is_dir());
    assert_eq!(state.config().sessions_dir.as_deref(), Some(sessions_dir.as_path()));
    assert!(state.orchestrator().sessions().await.is_empty());
    assert_eq!(
        state.dispatcher().builtins().names(),
        vec!["get_weather", "web_search", "trigger_n8n_workflow", "trigger_n8n_chat_workflow"]
    );
}

#[tokio::test]
async fn test_initialize_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.json");
    std::fs::write(&config_path, r#"{"max_tool_rounds": 0}"#).unwrap();

    assert!(AppState::initialize(Some(config_path)).await.is_err());
}
