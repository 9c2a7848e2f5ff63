//! Session Models
//!
//! Session summaries, the model catalogue, and user-facing notices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A saved chat session as listed by the session store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Unique session identifier
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    /// First user message, as given at creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

/// A selectable completion model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
}

/// Models offered to the user. The first entry is the default.
pub const SUPPORTED_MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "gpt-4o-mini",
        name: "GPT-4o Mini",
    },
    ModelInfo {
        id: "gpt-4o",
        name: "GPT-4o",
    },
    ModelInfo {
        id: "gpt-4.1-mini",
        name: "GPT-4.1 Mini",
    },
    ModelInfo {
        id: "gpt-4.1",
        name: "GPT-4.1",
    },
];

pub fn default_model_id() -> &'static str {
    SUPPORTED_MODELS[0].id
}

/// Display name for a model id; unknown ids are echoed back.
pub fn model_display_name(id: &str) -> &str {
    SUPPORTED_MODELS
        .iter()
        .find(|m| m.id == id)
        .map(|m| m.name)
        .unwrap_or(id)
}

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Non-blocking message for the front end (toast, status line)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatNotice {
    pub level: NoticeLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ChatNotice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            detail: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
