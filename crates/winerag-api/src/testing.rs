//! In-process stand-ins for the external services
//!
//! Used by the integration tests to drive the router without network access.

use crate::{create_router, state::AppContext};
use async_trait::async_trait;
use axum::Router;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use winerag_core::{
    AppConfig, ChatMessage, CompletionClient, RagError, Result, SearchBackend, SearchResult,
};

/// Search backend returning a fixed page of hits
#[derive(Default)]
pub struct MockSearch {
    results: Vec<SearchResult>,
    failure: Option<String>,
    delay: Option<Duration>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl MockSearch {
    pub fn with_contents(contents: &[&str]) -> Self {
        Self {
            results: contents.iter().map(|c| SearchResult::new(*c)).collect(),
            ..Default::default()
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Default::default()
        }
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queries received so far, with their limits
    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SearchBackend for MockSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push((query.to_string(), limit));
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(msg) => Err(RagError::Search(msg.clone())),
            None => Ok(self.results.clone()),
        }
    }

    fn name(&self) -> &str {
        "mock-search"
    }
}

/// Completion client echoing the context it was given
#[derive(Default)]
pub struct MockCompletion {
    failure: Option<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockCompletion {
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Default::default()
        }
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Conversations received so far
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CompletionClient for MockCompletion {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(messages.to_vec());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(msg) = &self.failure {
            return Err(RagError::Llm(msg.clone()));
        }
        let context = messages.last().map(|m| m.content.as_str()).unwrap_or("");
        Ok(format!("Recommended from context: {context}"))
    }

    fn name(&self) -> &str {
        "mock-completion"
    }
}

/// Build a context over the given clients
pub fn test_context(
    config: AppConfig,
    search: Option<Arc<dyn SearchBackend>>,
    completion: Option<Arc<dyn CompletionClient>>,
) -> Arc<AppContext> {
    Arc::new(AppContext::with_clients(config, search, completion))
}

/// Router with default config, no API key and healthy mock upstreams
pub fn create_router_for_testing() -> Router {
    create_router(test_context(
        AppConfig::default(),
        Some(Arc::new(MockSearch::with_contents(&[
            "Wine A: bold and fruity",
            "Wine B: dry and oaky",
        ]))),
        Some(Arc::new(MockCompletion::default())),
    ))
}
