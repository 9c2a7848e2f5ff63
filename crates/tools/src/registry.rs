//! External Tool Registry
//!
//! Tools that are not built in are resolved through this seam. The host
//! application supplies the implementation; the dispatcher only calls it.

use async_trait::async_trait;
use serde_json::Value;

use ragdesk_core::{CoreError, CoreResult, ToolDefinition};

#[async_trait]
pub trait ToolRegistry: Send + Sync {
    /// Definitions of every externally provided tool
    async fn tool_definitions(&self) -> Vec<ToolDefinition>;

    /// Run a tool by name. `Ok` carries the text output.
    async fn execute_tool(&self, name: &str, args: Value) -> CoreResult<String>;
}

/// Registry with no tools; every lookup fails with "Tool not found".
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyToolRegistry;

#[async_trait]
impl ToolRegistry for EmptyToolRegistry {
    async fn tool_definitions(&self) -> Vec<ToolDefinition> {
        Vec::new()
    }

    async fn execute_tool(&self, name: &str, _args: Value) -> CoreResult<String> {
        Err(CoreError::not_found(format!("Tool not found: {}", name)))
    }
}
