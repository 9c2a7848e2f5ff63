//! RAG Ingestion
//!
//! Hands uploaded documents to the `rag-build` workflow.

use std::path::Path;
use std::sync::Arc;

use ragdesk_tools::{WorkflowOutcome, WorkflowTrigger};
use serde::{Deserialize, Serialize};

use crate::utils::error::{AppError, AppResult};

pub const RAG_BUILD_WORKFLOW: &str = "rag-build";

/// Metadata for one file handed to the ingestion workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestFile {
    pub name: String,
    /// MIME type
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Size in bytes
    pub size: u64,
}

impl IngestFile {
    /// Describe a file on disk
    pub async fn from_path(path: &Path) -> AppResult<Self> {
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(AppError::validation(format!("Not a file: {}", path.display())));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| AppError::validation(format!("No file name: {}", path.display())))?;
        Ok(Self {
            mime_type: mime_type_for(&name).to_string(),
            name,
            size: metadata.len(),
        })
    }
}

/// MIME type from a file extension, for the document formats the pipeline accepts
pub fn mime_type_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("md") | Some("markdown") => "text/markdown",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("html") | Some("htm") => "text/html",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("doc") => "application/msword",
        _ => "application/octet-stream",
    }
}

pub struct RagIngestService {
    trigger: Arc<dyn WorkflowTrigger>,
}

impl RagIngestService {
    pub fn new(trigger: Arc<dyn WorkflowTrigger>) -> Self {
        Self { trigger }
    }

    /// Post `{workflow: "rag-build", files}` to the workflow engine.
    pub async fn trigger(&self, files: Vec<IngestFile>) -> AppResult<WorkflowOutcome> {
        if files.is_empty() {
            return Err(AppError::validation("No files to ingest"));
        }
        let count = files.len();
        let payload = serde_json::json!({
            "workflow": RAG_BUILD_WORKFLOW,
            "files": files,
        });
        let outcome = self.trigger.trigger(payload).await;
        if outcome.success {
            tracing::info!(files = count, message = %outcome.message, "RAG build triggered");
        } else {
            tracing::warn!(files = count, error = ?outcome.error, "RAG build trigger failed");
        }
        Ok(outcome)
    }
}
