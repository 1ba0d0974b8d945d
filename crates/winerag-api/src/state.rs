//! Application context shared across handlers
//!
//! Built once at startup and never mutated afterwards.
//!
//! Author: hephaex@gmail.com

use crate::error::AppError;
use std::sync::Arc;
use std::time::Instant;
use winerag_core::{AppConfig, CompletionClient, SearchBackend};
use winerag_rag::{OpenAiChatClient, RagPipeline};
use winerag_search::AzureSearchClient;

/// Application state shared across handlers
pub struct AppContext {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Search gateway, `None` when initialization failed
    pub search_client: Option<Arc<dyn SearchBackend>>,
    /// Completion gateway, `None` when initialization failed
    pub completion_client: Option<Arc<dyn CompletionClient>>,
    /// Pipeline over both clients, present only when both are
    pub rag: Option<Arc<RagPipeline>>,
}

impl AppContext {
    /// Build the external clients from config
    ///
    /// Failures are logged and leave the affected client unset; the server
    /// still starts so `/health` can report what is missing.
    pub fn initialize(config: AppConfig) -> Self {
        let search_client: Option<Arc<dyn SearchBackend>> =
            match AzureSearchClient::from_config(&config.search) {
                Ok(client) => {
                    tracing::info!(
                        endpoint = client.endpoint(),
                        index = %config.search.index_name,
                        "search client initialized"
                    );
                    Some(Arc::new(client))
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to initialize search client");
                    None
                }
            };

        let completion_client: Option<Arc<dyn CompletionClient>> =
            match OpenAiChatClient::from_config(&config.llm) {
                Ok(client) => {
                    tracing::info!(
                        base_url = %config.llm.base_url,
                        deployment = %config.llm.deployment,
                        "completion client initialized"
                    );
                    Some(Arc::new(client))
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to initialize completion client");
                    None
                }
            };

        Self::with_clients(config, search_client, completion_client)
    }

    /// Assemble a context from already-built clients
    pub fn with_clients(
        config: AppConfig,
        search_client: Option<Arc<dyn SearchBackend>>,
        completion_client: Option<Arc<dyn CompletionClient>>,
    ) -> Self {
        let rag = match (&search_client, &completion_client) {
            (Some(search), Some(completion)) => Some(Arc::new(
                RagPipeline::new(search.clone(), completion.clone())
                    .with_config(&config.rag, &config.search),
            )),
            _ => None,
        };

        Self {
            config,
            start_time: Instant::now(),
            search_client,
            completion_client,
            rag,
        }
    }

    /// Get the RAG pipeline, or the error every RAG route returns without it
    pub fn rag(&self) -> Result<Arc<RagPipeline>, AppError> {
        self.rag.clone().ok_or(AppError::NotInitialized)
    }

    /// Shared secret expected by the Auth Gate, if any
    pub fn api_key(&self) -> Option<&str> {
        self.config.auth.api_key.as_deref()
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
