//! Workflow Trigger
//!
//! Posts JSON payloads to the configured n8n webhook. Without a webhook the
//! trigger runs in simulation mode and reports success without any network
//! activity. Failures are folded into the outcome value, never raised.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ToolsConfig;
use crate::error::ToolError;
use ragdesk_llm::{build_http_client, DEFAULT_USER_AGENT};

pub const SIMULATED_MESSAGE: &str = "N8N workflow triggered (simulation).";
pub const SUCCESS_MESSAGE: &str = "N8N workflow triggered successfully.";
pub const FAILURE_MESSAGE: &str = "Failed to trigger N8N workflow.";

/// Result of one webhook trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkflowOutcome {
    pub fn simulated() -> Self {
        Self {
            success: true,
            message: SIMULATED_MESSAGE.to_string(),
            error: None,
        }
    }

    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: FAILURE_MESSAGE.to_string(),
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait WorkflowTrigger: Send + Sync {
    /// Send `payload` to the workflow engine.
    async fn trigger(&self, payload: Value) -> WorkflowOutcome;
}

/// n8n webhook client
pub struct WebhookWorkflowTrigger {
    client: reqwest::Client,
    webhook_url: Option<String>,
    timeout: Duration,
}

impl WebhookWorkflowTrigger {
    pub fn new(config: &ToolsConfig) -> Self {
        Self {
            client: build_http_client(DEFAULT_USER_AGENT, None),
            webhook_url: config.n8n_webhook_url().map(str::to_string),
            timeout: config.workflow_timeout,
        }
    }

    async fn post(&self, url: &str, payload: &Value) -> Result<String, ToolError> {
        let response = self
            .client
            .post(url)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(ToolError::Webhook {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response_message(&body))
    }
}

/// Pick the success message out of the webhook reply body. Any JSON object
/// with a string `message` wins; anything else (empty body, plain text,
/// other JSON) yields the default success text.
fn response_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| SUCCESS_MESSAGE.to_string())
}

#[async_trait]
impl WorkflowTrigger for WebhookWorkflowTrigger {
    async fn trigger(&self, payload: Value) -> WorkflowOutcome {
        let Some(url) = self.webhook_url.as_deref() else {
            tracing::warn!("N8N webhook URL not configured, simulating workflow trigger");
            return WorkflowOutcome::simulated();
        };

        match self.post(url, &payload).await {
            Ok(message) => {
                tracing::info!(url = url, "N8N workflow triggered");
                WorkflowOutcome::succeeded(message)
            }
            Err(e) => {
                tracing::error!(url = url, error = %e, "N8N workflow trigger failed");
                WorkflowOutcome::failed(e.to_string())
            }
        }
    }
}
