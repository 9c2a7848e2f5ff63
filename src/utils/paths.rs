//! Cross-Platform Path Utilities
//!
//! Resolves the application directory (~/.ragdesk/) and the files under it.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the Ragdesk directory (~/.ragdesk/)
pub fn ragdesk_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".ragdesk"))
}

/// Get the config file path (~/.ragdesk/config.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(ragdesk_dir()?.join("config.json"))
}

/// Get the saved sessions directory (~/.ragdesk/sessions/)
pub fn sessions_dir() -> AppResult<PathBuf> {
    Ok(ragdesk_dir()?.join("sessions"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Get the Ragdesk directory, creating it if it doesn't exist
pub fn ensure_ragdesk_dir() -> AppResult<PathBuf> {
    let path = ragdesk_dir()?;
    ensure_dir(&path)?;
    Ok(path)
}
