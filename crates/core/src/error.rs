//! Core Error Types
//!
//! Defines the error type shared across the Ragdesk workspace. It is
//! dependency-free (only thiserror + std) to keep the core crate lightweight.
//!
//! The application crate has its own error enum with variants for session
//! storage, completion backends and tool providers.

use thiserror::Error;

/// Core error type for the Ragdesk workspace.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Lookup of a named item (tool, session) that does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
