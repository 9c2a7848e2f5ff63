//! Tool Dispatcher
//!
//! Single entry point for tool invocations. Built-ins are matched by name;
//! every other name goes to the external `ToolRegistry`. Whatever happens
//! inside a handler (validation error, provider failure, registry error or
//! a panic) comes back as a `ToolResult`, so a turn never aborts because
//! a tool did.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use futures_util::FutureExt;
use serde_json::Value;

use crate::config::ToolsConfig;
use crate::error::ToolError;
use crate::fetch::{ContentFetcher, HttpContentFetcher};
use crate::impls::{GetWeatherTool, TriggerChatWorkflowTool, TriggerWorkflowTool, WebSearchTool};
use crate::registry::ToolRegistry;
use crate::search::{SearchProvider, SerpApiSearch};
use crate::trait_def::{BuiltinTools, Tool};
use crate::workflow::{WebhookWorkflowTrigger, WorkflowTrigger};
use ragdesk_core::{ToolCall, ToolContext, ToolDefinition, ToolResult};
use ragdesk_llm::ToolCallRequest;

pub struct ToolDispatcher {
    builtins: BuiltinTools,
    registry: Arc<dyn ToolRegistry>,
}

impl ToolDispatcher {
    /// Dispatcher over an explicit built-in table.
    pub fn new(builtins: BuiltinTools, registry: Arc<dyn ToolRegistry>) -> Self {
        Self { builtins, registry }
    }

    /// Dispatcher with the four standard built-ins over the given providers.
    pub fn with_providers(
        search: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn ContentFetcher>,
        workflow: Arc<dyn WorkflowTrigger>,
        registry: Arc<dyn ToolRegistry>,
    ) -> Self {
        let mut builtins = BuiltinTools::new();
        builtins.register(Arc::new(GetWeatherTool::new()));
        builtins.register(Arc::new(WebSearchTool::new(search, fetcher)));
        builtins.register(Arc::new(TriggerWorkflowTool::new(workflow.clone())));
        builtins.register(Arc::new(TriggerChatWorkflowTool::new(workflow)));
        Self::new(builtins, registry)
    }

    /// Dispatcher wired to the HTTP providers described by `config`.
    pub fn from_config(config: &ToolsConfig, registry: Arc<dyn ToolRegistry>) -> Self {
        Self::with_providers(
            Arc::new(SerpApiSearch::new(config)),
            Arc::new(HttpContentFetcher::new(config)),
            Arc::new(WebhookWorkflowTrigger::new(config)),
            registry,
        )
    }

    pub fn builtins(&self) -> &BuiltinTools {
        &self.builtins
    }

    /// Built-in definitions first, then registry tools whose names are not
    /// already taken.
    pub async fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions = self.builtins.definitions();
        for external in self.registry.tool_definitions().await {
            if definitions.iter().any(|d| d.name == external.name) {
                tracing::warn!(tool = %external.name, "Registry tool shadowed by built-in");
                continue;
            }
            definitions.push(external);
        }
        definitions
    }

    /// Definitions in the OpenAI function-calling shape
    pub async fn openai_tools(&self) -> Vec<Value> {
        self.definitions()
            .await
            .iter()
            .map(ToolDefinition::to_openai_format)
            .collect()
    }

    /// Run one tool with no owning session.
    pub async fn execute(&self, name: &str, args: Value) -> ToolResult {
        self.execute_in(&ToolContext::detached(), name, args).await
    }

    /// Run one tool. Never fails: errors and panics become `ToolResult::Failure`.
    pub async fn execute_in(&self, ctx: &ToolContext, name: &str, args: Value) -> ToolResult {
        let started = Instant::now();
        let outcome = AssertUnwindSafe(self.run(ctx, name, args)).catch_unwind().await;

        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => ToolResult::failure(e.to_string()),
            Err(panic) => {
                let err = ToolError::Panicked {
                    tool: name.to_string(),
                    message: panic_message(panic.as_ref()),
                };
                tracing::error!(tool = name, error = %err, "Tool handler panicked");
                ToolResult::failure(err.to_string())
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match result.error() {
            Some(error) => tracing::warn!(
                tool = name,
                call_id = ctx.tool_call_id(),
                elapsed_ms,
                error,
                "Tool failed"
            ),
            None => tracing::info!(tool = name, call_id = ctx.tool_call_id(), elapsed_ms, "Tool completed"),
        }
        result
    }

    async fn run(&self, ctx: &ToolContext, name: &str, args: Value) -> Result<ToolResult, ToolError> {
        if let Some(tool) = self.builtins.get(name) {
            return tool.execute(ctx, args).await;
        }
        let content = self.registry.execute_tool(name, args).await?;
        Ok(ToolResult::success(content))
    }

    /// Run several calls concurrently. Results keep the order of `calls`.
    pub async fn execute_batch(
        &self,
        session_id: Option<&str>,
        calls: Vec<ToolCallRequest>,
    ) -> Vec<ToolCall> {
        let futures = calls.into_iter().map(|call| async move {
            let mut ctx = ToolContext::new(call.id.clone());
            if let Some(session_id) = session_id {
                ctx = ctx.with_session(session_id);
            }
            let result = self
                .execute_in(&ctx, &call.name, call.arguments.clone())
                .await;
            ToolCall {
                id: call.id,
                name: call.name,
                arguments: call.arguments,
                result,
            }
        });
        join_all(futures).await
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
