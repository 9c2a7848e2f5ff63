//! Built-in tool implementations.

mod weather;
mod web_search;
mod workflow;

pub use weather::GetWeatherTool;
pub use web_search::WebSearchTool;
pub use workflow::{TriggerChatWorkflowTool, TriggerWorkflowTool};

use serde_json::Value;

/// Trimmed, non-empty string argument
pub(crate) fn string_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
