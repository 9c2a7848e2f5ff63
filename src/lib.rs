//! Ragdesk
//!
//! Tool-calling chat sessions over a streaming completion backend.
//! It includes:
//! - The chat orchestrator (session lifecycle, turns, streaming)
//! - RAG ingestion through the workflow webhook
//! - Storage layer (session stores, JSON config)
//! - Data models and utilities

pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use models::session::{ChatNotice, NoticeLevel, SessionInfo, SUPPORTED_MODELS};
pub use models::settings::{AppConfig, SettingsUpdate};
pub use services::chat::{ChatOrchestrator, ChatState, SubmitOutcome};
pub use state::AppState;
pub use storage::{InMemorySessionStore, JsonFileSessionStore, SessionStore};
pub use utils::error::{AppError, AppResult};
