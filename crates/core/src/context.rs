//! Tool Execution Context
//!
//! Read-only information handed to a tool for one invocation. Tools cannot
//! reach back into the chat session through it.

/// Context for tool-level execution.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Session that triggered the call, when known
    session_id: Option<String>,
    /// Unique identifier for this specific tool call.
    tool_call_id: String,
}

impl ToolContext {
    /// Create a context for a call with no owning session.
    pub fn new(tool_call_id: impl Into<String>) -> Self {
        Self {
            session_id: None,
            tool_call_id: tool_call_id.into(),
        }
    }

    /// Create a context with a freshly generated call id.
    pub fn detached() -> Self {
        Self::new(format!("call_{}", uuid::Uuid::new_v4().simple()))
    }

    /// Attach the owning session.
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn tool_call_id(&self) -> &str {
        &self.tool_call_id
    }
}
