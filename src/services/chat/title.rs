//! Session title generation.

pub const DEFAULT_SESSION_TITLE: &str = "New Chat";

/// Derive a session title from the first user message.
///
/// Whitespace is collapsed; text longer than `max_len` characters is cut on a
/// char boundary and marked with `...` (the marker counts toward `max_len`).
pub fn generate_session_title(text: Option<&str>, max_len: usize) -> String {
    let collapsed = text
        .unwrap_or_default()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if collapsed.is_empty() {
        return DEFAULT_SESSION_TITLE.to_string();
    }

    if collapsed.chars().count() <= max_len {
        return collapsed;
    }

    let keep = max_len.saturating_sub(3).max(1);
    let cut: String = collapsed.chars().take(keep).collect();
    format!("{}...", cut.trim_end())
}
