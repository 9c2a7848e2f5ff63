//! Chat Orchestrator Integration Tests
//!
//! Drives the orchestrator end to end over a scripted backend:
//! - Turn lifecycle and streaming
//! - Session persistence ordering
//! - Session switching, deletion and clearing
//! - Stale chunks after a session change

use std::sync::atomic::Ordering;
use std::sync::Arc;

use ragdesk::models::session::NoticeLevel;
use ragdesk::services::chat::{RejectReason, SubmitOutcome, TurnPhase};
use ragdesk::storage::SessionStore;
use ragdesk_core::MessageRole;
use ragdesk_llm::LlmError;
use serde_json::json;
use tokio::sync::Notify;

use crate::support::{eventually, new_log, orchestrator, RecordingStore, Round, ScriptedBackend};

// ============================================================================
// Turns
// ============================================================================

#[tokio::test]
async fn test_hello_round_trip() {
    let log = new_log();
    let backend = Arc::new(ScriptedBackend::new(
        vec![Round::text(&["Hi", " there", "!"])],
        log.clone(),
    ));
    let store = Arc::new(RecordingStore::new(log.clone()));
    let chat = orchestrator(backend.clone(), store.clone());

    let outcome = chat.submit("Hello").await;
    let SubmitOutcome::Finalized(reply) = outcome else {
        panic!("expected a finalized turn, got {:?}", outcome);
    };
    assert_eq!(reply.content, "Hi there!");

    let state = chat.state().await;
    assert_eq!(state.messages.len(), 2);
    assert_eq!(state.messages[0].role, MessageRole::User);
    assert_eq!(state.messages[0].content, "Hello");
    assert_eq!(state.messages[1].role, MessageRole::Assistant);
    assert_eq!(state.messages[1].content, "Hi there!");
    assert!(state.streaming_buffer.is_empty());
    assert!(!state.is_processing);
    assert_eq!(state.phase, TurnPhase::Idle);
    assert!(state.persisted);

    let sessions = chat.sessions().await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, state.session_id);
    assert_eq!(sessions[0].title, "Hello");

    let stored = store.get_messages(&state.session_id).await.unwrap();
    assert_eq!(stored, state.messages);
}

#[tokio::test]
async fn test_session_created_before_backend_call() {
    let log = new_log();
    let backend = Arc::new(ScriptedBackend::new(vec![Round::text(&["ok"])], log.clone()));
    let store = Arc::new(RecordingStore::new(log.clone()));
    let chat = orchestrator(backend, store);
    let session_id = chat.state().await.session_id;

    chat.submit("First message").await;

    let entries = log.lock().unwrap().clone();
    let create = entries
        .iter()
        .position(|e| *e == format!("create:{}", session_id))
        .expect("session was never created");
    let backend_call = entries
        .iter()
        .position(|e| e == "backend")
        .expect("backend was never called");
    assert!(create < backend_call, "log: {:?}", entries);
}

#[tokio::test]
async fn test_second_turn_appends_to_existing_session() {
    let log = new_log();
    let backend = Arc::new(ScriptedBackend::new(
        vec![Round::text(&["one"]), Round::text(&["two"])],
        log.clone(),
    ));
    let store = Arc::new(RecordingStore::new(log.clone()));
    let chat = orchestrator(backend.clone(), store.clone());

    chat.submit("first").await;
    chat.submit("second").await;

    let state = chat.state().await;
    assert_eq!(state.messages.len(), 4);
    let creates = log
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.starts_with("create:"))
        .count();
    assert_eq!(creates, 1);

    // The second request carries the whole transcript
    let requests = backend.requests.lock().unwrap();
    assert_eq!(requests[1].0.len(), 3);
    assert_eq!(requests[1].0[2].content, "second");
}

#[tokio::test]
async fn test_blank_submit_rejected() {
    let log = new_log();
    let backend = Arc::new(ScriptedBackend::new(Vec::new(), log.clone()));
    let store = Arc::new(RecordingStore::new(log.clone()));
    let chat = orchestrator(backend.clone(), store);

    assert_eq!(
        chat.submit("   \n\t").await,
        SubmitOutcome::Rejected(RejectReason::Blank)
    );
    assert!(chat.state().await.messages.is_empty());
    assert_eq!(backend.request_count(), 0);
}

#[tokio::test]
async fn test_submit_while_processing_rejected() {
    let log = new_log();
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(
        ScriptedBackend::new(vec![Round::text(&["slow", " reply"])], log.clone()).gated(gate.clone()),
    );
    let store = Arc::new(RecordingStore::new(log.clone()));
    let chat = orchestrator(backend.clone(), store);

    let first = tokio::spawn({
        let chat = chat.clone();
        async move { chat.submit("first").await }
    });
    assert!(eventually(|| async { chat.state().await.streaming_buffer == "slow" }).await);

    assert_eq!(
        chat.submit("second").await,
        SubmitOutcome::Rejected(RejectReason::Busy)
    );

    gate.notify_one();
    let outcome = first.await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Finalized(ref m) if m.content == "slow reply"));
    assert_eq!(backend.request_count(), 1);
    assert_eq!(chat.state().await.messages.len(), 2);
}

#[tokio::test]
async fn test_backend_failure_still_finalizes() {
    let log = new_log();
    let backend = Arc::new(ScriptedBackend::new(
        vec![Round::Fail(LlmError::NetworkError {
            message: "connection refused".to_string(),
        })],
        log.clone(),
    ));
    let store = Arc::new(RecordingStore::new(log.clone()));
    let chat = orchestrator(backend, store);
    let mut notices = chat.subscribe();

    let outcome = chat.submit("Hello").await;
    let SubmitOutcome::Finalized(reply) = outcome else {
        panic!("expected a finalized turn, got {:?}", outcome);
    };
    assert!(reply.content.contains("connection refused"));

    let state = chat.state().await;
    assert!(!state.is_processing);
    assert_eq!(state.messages.len(), 2);

    let mut saw_error = false;
    while let Ok(notice) = notices.try_recv() {
        saw_error |= notice.level == NoticeLevel::Error;
    }
    assert!(saw_error);
}

#[tokio::test]
async fn test_failed_create_keeps_turn_going() {
    let log = new_log();
    let backend = Arc::new(ScriptedBackend::new(vec![Round::text(&["still here"])], log.clone()));
    let store = Arc::new(RecordingStore::new(log.clone()));
    store.fail_creates.store(true, Ordering::SeqCst);
    let chat = orchestrator(backend, store);
    let mut notices = chat.subscribe();

    let outcome = chat.submit("Hello").await;
    assert!(matches!(outcome, SubmitOutcome::Finalized(ref m) if m.content == "still here"));

    let state = chat.state().await;
    assert!(!state.persisted);
    assert_eq!(state.messages.len(), 2);

    let notice = notices.try_recv().unwrap();
    assert_eq!(notice.level, NoticeLevel::Warning);
    assert_eq!(notice.message, "Failed to save session");
}

// ============================================================================
// Tool calls inside a turn
// ============================================================================

#[tokio::test]
async fn test_tool_failure_still_finalizes() {
    let log = new_log();
    let backend = Arc::new(ScriptedBackend::new(
        vec![
            Round::tool("web_search", json!({"url": "http://localhost:8080/admin"})),
            Round::text(&["I couldn't reach that page."]),
        ],
        log.clone(),
    ));
    let store = Arc::new(RecordingStore::new(log.clone()));
    let chat = orchestrator(backend.clone(), store);

    let outcome = chat.submit("Read localhost for me").await;
    let SubmitOutcome::Finalized(reply) = outcome else {
        panic!("expected a finalized turn, got {:?}", outcome);
    };
    assert_eq!(reply.content, "I couldn't reach that page.");
    assert_eq!(reply.tool_calls.len(), 1);
    assert_eq!(reply.tool_calls[0].name, "web_search");
    assert!(reply.tool_calls[0].result.is_failure());

    // The failed result went back to the model in the second round
    let requests = backend.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    let replayed = requests[1].0.last().unwrap();
    assert_eq!(replayed.tool_calls.len(), 1);
    assert!(replayed.tool_calls[0].result.is_failure());
}

#[tokio::test]
async fn test_builtin_tools_offered_to_backend() {
    let log = new_log();
    let backend = Arc::new(ScriptedBackend::new(vec![Round::text(&["ok"])], log.clone()));
    let store = Arc::new(RecordingStore::new(log.clone()));
    let chat = orchestrator(backend.clone(), store);

    chat.submit("What's on?").await;

    let requests = backend.requests.lock().unwrap();
    let names = &requests[0].1;
    for expected in [
        "get_weather",
        "web_search",
        "trigger_n8n_workflow",
        "trigger_n8n_chat_workflow",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {}", expected);
    }
}

#[tokio::test]
async fn test_weather_tool_round() {
    let log = new_log();
    let backend = Arc::new(ScriptedBackend::new(
        vec![
            Round::tool("get_weather", json!({"location": "Lisbon"})),
            Round::text(&["Looks fine."]),
        ],
        log.clone(),
    ));
    let store = Arc::new(RecordingStore::new(log.clone()));
    let chat = orchestrator(backend, store);

    let SubmitOutcome::Finalized(reply) = chat.submit("Weather in Lisbon?").await else {
        panic!("turn did not finalize");
    };
    let call = &reply.tool_calls[0];
    assert!(!call.result.is_failure());
    assert!(call.result.to_content().contains("Lisbon"));
}

// ============================================================================
// Sessions
// ============================================================================

#[tokio::test]
async fn test_switch_to_current_session_is_noop() {
    let log = new_log();
    let backend = Arc::new(ScriptedBackend::new(Vec::new(), log.clone()));
    let store = Arc::new(RecordingStore::new(log.clone()));
    let chat = orchestrator(backend, store);
    let current = chat.state().await.session_id;

    assert!(!chat.switch_session(&current).await);
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(chat.state().await.session_id, current);
}

#[tokio::test]
async fn test_switch_loads_saved_transcript() {
    let log = new_log();
    let backend = Arc::new(ScriptedBackend::new(
        vec![Round::text(&["first reply"]), Round::text(&["second reply"])],
        log.clone(),
    ));
    let store = Arc::new(RecordingStore::new(log.clone()));
    let chat = orchestrator(backend, store);

    chat.submit("first chat").await;
    let first_id = chat.state().await.session_id;

    let second_id = chat.new_session().await;
    assert_ne!(first_id, second_id);
    assert!(chat.state().await.messages.is_empty());
    chat.submit("second chat").await;

    assert!(chat.switch_session(&first_id).await);
    let state = chat.state().await;
    assert_eq!(state.session_id, first_id);
    assert_eq!(state.messages.len(), 2);
    assert_eq!(state.messages[1].content, "first reply");
    assert!(state.persisted);
    assert_eq!(chat.sessions().await.len(), 2);
}

#[tokio::test]
async fn test_new_session_autosaves_unsaved_transcript() {
    let log = new_log();
    let backend = Arc::new(ScriptedBackend::new(vec![Round::text(&["reply"])], log.clone()));
    let store = Arc::new(RecordingStore::new(log.clone()));
    store.fail_creates.store(true, Ordering::SeqCst);
    let chat = orchestrator(backend, store.clone());

    chat.submit("keep me").await;
    let unsaved_id = chat.state().await.session_id;
    assert!(chat.state().await.is_dirty());

    store.fail_creates.store(false, Ordering::SeqCst);
    chat.new_session().await;

    let saved = store.get_messages(&unsaved_id).await.unwrap();
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].content, "keep me");
    assert!(chat.sessions().await.iter().any(|s| s.id == unsaved_id));
}

#[tokio::test]
async fn test_delete_active_session() {
    let log = new_log();
    let backend = Arc::new(ScriptedBackend::new(vec![Round::text(&["reply"])], log.clone()));
    let store = Arc::new(RecordingStore::new(log.clone()));
    let chat = orchestrator(backend, store.clone());

    chat.submit("doomed").await;
    let doomed = chat.state().await.session_id;

    chat.delete_session(&doomed).await;

    let state = chat.state().await;
    assert_ne!(state.session_id, doomed);
    assert!(state.messages.is_empty());
    assert!(!state.persisted);
    assert!(chat.sessions().await.iter().all(|s| s.id != doomed));
    assert!(store.get_messages(&doomed).await.is_err());
}

#[tokio::test]
async fn test_delete_other_session_keeps_view() {
    let log = new_log();
    let backend = Arc::new(ScriptedBackend::new(
        vec![Round::text(&["a"]), Round::text(&["b"])],
        log.clone(),
    ));
    let store = Arc::new(RecordingStore::new(log.clone()));
    let chat = orchestrator(backend, store);

    chat.submit("old").await;
    let old_id = chat.state().await.session_id;
    chat.new_session().await;
    chat.submit("current").await;
    let current = chat.state().await;

    chat.delete_session(&old_id).await;

    let after = chat.state().await;
    assert_eq!(after.session_id, current.session_id);
    assert_eq!(after.messages, current.messages);
    let sessions = chat.sessions().await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, current.session_id);
}

#[tokio::test]
async fn test_clear_messages_keeps_session_record() {
    let log = new_log();
    let backend = Arc::new(ScriptedBackend::new(vec![Round::text(&["reply"])], log.clone()));
    let store = Arc::new(RecordingStore::new(log.clone()));
    let chat = orchestrator(backend, store.clone());

    chat.submit("Hello").await;
    let session_id = chat.state().await.session_id;

    chat.clear_messages().await;

    assert!(chat.state().await.messages.is_empty());
    assert!(store.get_messages(&session_id).await.unwrap().is_empty());
    assert_eq!(store.list_sessions().await.unwrap()[0].title, "Hello");
}

#[tokio::test]
async fn test_update_model_notice() {
    let log = new_log();
    let backend = Arc::new(ScriptedBackend::new(Vec::new(), log.clone()));
    let store = Arc::new(RecordingStore::new(log.clone()));
    let chat = orchestrator(backend, store);
    let mut notices = chat.subscribe();

    chat.update_model("gpt-4o").await;

    assert_eq!(chat.state().await.model, "gpt-4o");
    let notice = notices.try_recv().unwrap();
    assert_eq!(notice.level, NoticeLevel::Success);
    assert_eq!(notice.message, "Model updated to GPT-4o");
}

// ============================================================================
// Stale chunks
// ============================================================================

#[tokio::test]
async fn test_chunks_dropped_after_session_change() {
    let log = new_log();
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(
        ScriptedBackend::new(vec![Round::text(&["partial", " late"])], log.clone()).gated(gate.clone()),
    );
    let store = Arc::new(RecordingStore::new(log.clone()));
    let chat = orchestrator(backend, store.clone());
    let original = chat.state().await.session_id;

    let turn = tokio::spawn({
        let chat = chat.clone();
        async move { chat.submit("long question").await }
    });
    assert!(eventually(|| async { chat.state().await.streaming_buffer == "partial" }).await);

    let fresh = chat.new_session().await;
    gate.notify_one();
    assert_eq!(turn.await.unwrap(), SubmitOutcome::Detached);

    let state = chat.state().await;
    assert_eq!(state.session_id, fresh);
    assert!(state.streaming_buffer.is_empty());
    assert!(state.messages.is_empty());
    assert!(!state.is_processing);

    // The detached turn still lands in its own session
    assert!(
        eventually(|| async {
            store
                .get_messages(&original)
                .await
                .map(|m| m.len() == 2 && m[1].content == "partial late")
                .unwrap_or(false)
        })
        .await
    );
}

#[tokio::test]
async fn test_switch_session_detaches_turn() {
    let log = new_log();
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(
        ScriptedBackend::new(
            vec![Round::text(&["saved"]), Round::text(&["partial", " late"])],
            log.clone(),
        )
        .gated(gate.clone()),
    );
    let store = Arc::new(RecordingStore::new(log.clone()));
    let chat = orchestrator(backend, store.clone());

    // Let the first round through without waiting
    gate.notify_one();
    chat.submit("first chat").await;
    let first_id = chat.state().await.session_id;
    let second_id = chat.new_session().await;

    let turn = tokio::spawn({
        let chat = chat.clone();
        async move { chat.submit("second chat").await }
    });
    assert!(eventually(|| async { chat.state().await.streaming_buffer == "partial" }).await);

    assert!(chat.switch_session(&first_id).await);
    gate.notify_one();
    assert_eq!(turn.await.unwrap(), SubmitOutcome::Detached);

    let state = chat.state().await;
    assert_eq!(state.session_id, first_id);
    assert_eq!(state.messages.len(), 2);
    assert_eq!(state.messages[1].content, "saved");
    assert!(state.streaming_buffer.is_empty());
    assert!(!state.is_processing);

    assert!(
        eventually(|| async {
            store
                .get_messages(&second_id)
                .await
                .map(|m| m.len() == 2 && m[1].content == "partial late")
                .unwrap_or(false)
        })
        .await
    );
}

// ============================================================================
// Store hiccups
// ============================================================================

#[tokio::test]
async fn test_new_session_during_first_save_saves_once() {
    let log = new_log();
    let backend = Arc::new(ScriptedBackend::new(vec![Round::text(&["reply"])], log.clone()));
    let store = Arc::new(RecordingStore::new(log.clone()));
    store.append_delay_ms.store(100, Ordering::SeqCst);
    let chat = orchestrator(backend, store.clone());
    let original = chat.state().await.session_id;

    let turn = tokio::spawn({
        let chat = chat.clone();
        async move { chat.submit("Hello").await }
    });
    tokio::time::sleep(std::time::Duration::from_millis(30)).await;
    chat.new_session().await;
    turn.await.unwrap();

    assert!(
        eventually(|| async {
            store
                .get_messages(&original)
                .await
                .map(|m| m.last().map(|l| l.role == MessageRole::Assistant).unwrap_or(false))
                .unwrap_or(false)
        })
        .await
    );
    let saved = store.get_messages(&original).await.unwrap();
    let contents: Vec<&str> = saved.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["Hello", "reply"]);
    assert_eq!(store.appends_to(&original), 2);
}

#[tokio::test]
async fn test_failed_reply_append_is_retried() {
    let log = new_log();
    let backend = Arc::new(ScriptedBackend::new(vec![Round::text(&["reply"])], log.clone()));
    let store = Arc::new(RecordingStore::new(log.clone()));
    store.fail_assistant_appends.store(1, Ordering::SeqCst);
    let chat = orchestrator(backend, store.clone());
    let mut notices = chat.subscribe();

    chat.submit("Hello").await;

    let state = chat.state().await;
    let stored = store.get_messages(&state.session_id).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored, state.messages);
    while let Ok(notice) = notices.try_recv() {
        assert_ne!(notice.message, "Reply not saved");
    }
}

#[tokio::test]
async fn test_unsaved_reply_raises_notice() {
    let log = new_log();
    let backend = Arc::new(ScriptedBackend::new(vec![Round::text(&["reply"])], log.clone()));
    let store = Arc::new(RecordingStore::new(log.clone()));
    store.fail_assistant_appends.store(2, Ordering::SeqCst);
    let chat = orchestrator(backend, store.clone());
    let mut notices = chat.subscribe();

    let outcome = chat.submit("Hello").await;
    assert!(matches!(outcome, SubmitOutcome::Finalized(ref m) if m.content == "reply"));

    let state = chat.state().await;
    assert_eq!(state.messages.len(), 2);
    assert_eq!(store.get_messages(&state.session_id).await.unwrap().len(), 1);

    let mut warned = false;
    while let Ok(notice) = notices.try_recv() {
        warned |= notice.level == NoticeLevel::Warning && notice.message == "Reply not saved";
    }
    assert!(warned);
}
