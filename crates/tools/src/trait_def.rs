//! Tool Trait and Built-in Table
//!
//! Defines the `Tool` trait every built-in implements, and `BuiltinTools`,
//! the name-indexed table the dispatcher consults before falling back to
//! the external registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ToolError;
use ragdesk_core::{ToolContext, ToolDefinition, ToolResult};

/// Unified tool interface.
///
/// Handlers return `Err` for any failure; the dispatcher turns that into
/// `ToolResult::Failure`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name of this tool (e.g., "get_weather")
    fn name(&self) -> &str;

    /// Description shown to the model
    fn description(&self) -> &str;

    /// JSON schema describing the arguments
    fn parameters_schema(&self) -> Value;

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<ToolResult, ToolError>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.parameters_schema())
    }
}

/// Table of built-in tools, iterated in registration order.
#[derive(Default)]
pub struct BuiltinTools {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl BuiltinTools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A tool with the same name is replaced in place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if !self.tools.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.tools.insert(name, tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Names in registration order
    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Definitions in registration order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.definition())
            .collect()
    }
}
