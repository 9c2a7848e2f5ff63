//! Application State
//!
//! Wires configuration, providers, the session store and the chat
//! orchestrator together.

use std::path::PathBuf;
use std::sync::Arc;

use ragdesk_llm::{LlmProvider, OpenAiCompatibleProvider};
use ragdesk_tools::{
    ContentFetcher, EmptyToolRegistry, HttpContentFetcher, SearchProvider, SerpApiSearch,
    ToolDispatcher, ToolRegistry, WebhookWorkflowTrigger, WorkflowTrigger,
};

use crate::models::settings::AppConfig;
use crate::services::chat::{ChatOrchestrator, OrchestratorSettings};
use crate::services::ingest::RagIngestService;
use crate::storage::{ConfigService, JsonFileSessionStore, SessionStore};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::sessions_dir;

pub struct AppState {
    config: AppConfig,
    dispatcher: Arc<ToolDispatcher>,
    orchestrator: Arc<ChatOrchestrator>,
    ingest: RagIngestService,
}

impl AppState {
    /// Load configuration (default ~/.ragdesk/config.json) and build every
    /// service from it.
    pub async fn initialize(config_path: Option<PathBuf>) -> AppResult<Self> {
        let service = match config_path {
            Some(path) => ConfigService::load(path)?,
            None => ConfigService::new()?,
        };
        let config = service.effective_config();
        config.validate().map_err(AppError::validation)?;

        let dir = match &config.sessions_dir {
            Some(dir) => dir.clone(),
            None => sessions_dir()?,
        };
        let store: Arc<dyn SessionStore> = Arc::new(JsonFileSessionStore::open(dir).await?);
        let backend: Arc<dyn LlmProvider> =
            Arc::new(OpenAiCompatibleProvider::new(config.provider_config())?);

        Ok(Self::assemble(config, backend, store, Arc::new(EmptyToolRegistry)).await)
    }

    /// Build the services over explicit collaborators.
    pub async fn assemble(
        config: AppConfig,
        backend: Arc<dyn LlmProvider>,
        store: Arc<dyn SessionStore>,
        registry: Arc<dyn ToolRegistry>,
    ) -> Self {
        let tools_config = config.tools_config();
        let workflow: Arc<dyn WorkflowTrigger> = Arc::new(WebhookWorkflowTrigger::new(&tools_config));
        let search: Arc<dyn SearchProvider> = Arc::new(SerpApiSearch::new(&tools_config));
        let fetcher: Arc<dyn ContentFetcher> = Arc::new(HttpContentFetcher::new(&tools_config));

        if tools_config.serpapi_key().is_none() {
            tracing::warn!("SERPAPI key not configured; web_search will return manual search links");
        }
        if tools_config.n8n_webhook_url().is_none() {
            tracing::warn!("N8N webhook not configured; workflow triggers are simulated");
        }

        let dispatcher = Arc::new(ToolDispatcher::with_providers(
            search,
            fetcher,
            Arc::clone(&workflow),
            registry,
        ));
        tracing::info!(tools = ?dispatcher.builtins().names(), "Built-in tools registered");
        let orchestrator = Arc::new(ChatOrchestrator::new(
            backend,
            Arc::clone(&dispatcher),
            store,
            OrchestratorSettings {
                max_tool_rounds: config.max_tool_rounds,
                session_title_max_len: config.session_title_max_len,
            },
            config.default_model.clone(),
        ));
        orchestrator.refresh_sessions().await;

        Self {
            config,
            dispatcher,
            orchestrator,
            ingest: RagIngestService::new(workflow),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> Arc<ToolDispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn orchestrator(&self) -> Arc<ChatOrchestrator> {
        Arc::clone(&self.orchestrator)
    }

    pub fn ingest(&self) -> &RagIngestService {
        &self.ingest
    }
}
