use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::string_arg;
use crate::error::ToolError;
use crate::trait_def::Tool;
use crate::workflow::WorkflowTrigger;
use ragdesk_core::{ToolContext, ToolResult};

/// `trigger_n8n_workflow`: forward an arbitrary payload, report the outcome as JSON
pub struct TriggerWorkflowTool {
    trigger: Arc<dyn WorkflowTrigger>,
}

impl TriggerWorkflowTool {
    pub fn new(trigger: Arc<dyn WorkflowTrigger>) -> Self {
        Self { trigger }
    }
}

#[async_trait]
impl Tool for TriggerWorkflowTool {
    fn name(&self) -> &str {
        "trigger_n8n_workflow"
    }

    fn description(&self) -> &str {
        "Triggers a specified N8N workflow with a given payload, typically for data ingestion or RAG builds."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "payload": {
                    "type": "object",
                    "description": "The JSON payload to send to the N8N workflow.",
                    "properties": {
                        "workflow": {
                            "type": "string",
                            "description": "Identifier for the workflow, e.g., \"rag-build\"."
                        },
                        "files": {
                            "type": "array",
                            "description": "List of files to process.",
                            "items": { "type": "object" }
                        }
                    },
                    "required": ["workflow"]
                }
            },
            "required": ["payload"]
        })
    }

    async fn execute(&self, _ctx: &ToolContext, args: Value) -> Result<ToolResult, ToolError> {
        let payload = args
            .get("payload")
            .filter(|p| p.is_object())
            .cloned()
            .ok_or_else(|| ToolError::validation("payload must be a JSON object"))?;

        let outcome = self.trigger.trigger(payload).await;
        let content = serde_json::to_string(&outcome)
            .map_err(|e| ToolError::validation(format!("Failed to encode workflow outcome: {}", e)))?;
        Ok(ToolResult::success(content))
    }
}

/// `trigger_n8n_chat_workflow`: ask the RAG chat workflow a question
pub struct TriggerChatWorkflowTool {
    trigger: Arc<dyn WorkflowTrigger>,
}

impl TriggerChatWorkflowTool {
    pub fn new(trigger: Arc<dyn WorkflowTrigger>) -> Self {
        Self { trigger }
    }
}

#[async_trait]
impl Tool for TriggerChatWorkflowTool {
    fn name(&self) -> &str {
        "trigger_n8n_chat_workflow"
    }

    fn description(&self) -> &str {
        "Sends a query to the N8N chat workflow to get information from the RAG-processed data."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The user's question to ask the RAG data."
                },
                "sessionId": {
                    "type": "string",
                    "description": "The current chat session ID for context."
                }
            },
            "required": ["query", "sessionId"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<ToolResult, ToolError> {
        let query = string_arg(&args, "query")
            .ok_or_else(|| ToolError::validation("query parameter is required"))?;
        // Fall back to the invoking session when the model omits the id.
        let session_id = string_arg(&args, "sessionId")
            .or(ctx.session_id())
            .unwrap_or_default();

        let outcome = self
            .trigger
            .trigger(json!({
                "workflow": "chat",
                "query": query,
                "sessionId": session_id,
            }))
            .await;
        Ok(ToolResult::success(outcome.message))
    }
}
