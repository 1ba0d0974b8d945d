//! Azure AI Search client
//!
//! Issues text queries against the documents search endpoint of one index.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use winerag_core::{RagError, Result, SearchBackend, SearchConfig, SearchResult};

/// Azure AI Search REST client bound to a single index
pub struct AzureSearchClient {
    client: Client,
    endpoint: String,
    index_name: String,
    api_key: String,
    api_version: String,
    select: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    search: &'a str,
    top: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    select: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    value: Vec<SearchResult>,
}

impl AzureSearchClient {
    /// Create a new client
    pub fn new(
        endpoint: impl AsRef<str>,
        index_name: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: normalize_endpoint(endpoint.as_ref()),
            index_name: index_name.into(),
            api_key: api_key.into(),
            api_version: SearchConfig::default().api_version,
            select: vec!["content".to_string()],
        }
    }

    /// Create from config
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        let endpoint = config
            .service
            .as_ref()
            .ok_or_else(|| RagError::Config("SEARCH_SERVICE_NAME is required".to_string()))?;
        let api_key = config
            .api_key
            .as_ref()
            .ok_or_else(|| RagError::Config("SEARCH_API_KEY is required".to_string()))?;

        Ok(Self::new(endpoint, config.index_name.clone(), api_key.clone())
            .with_api_version(config.api_version.clone())
            .with_select(config.select.clone()))
    }

    /// Override the REST api-version
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Fields returned for each hit; an empty list returns every retrievable field
    pub fn with_select(mut self, fields: Vec<String>) -> Self {
        self.select = fields;
        self
    }

    /// Base URL of the search service
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn search_url(&self) -> String {
        format!(
            "{}/indexes/{}/docs/search?api-version={}",
            self.endpoint, self.index_name, self.api_version
        )
    }
}

/// Expand a bare service name into its public endpoint
fn normalize_endpoint(raw: &str) -> String {
    let raw = raw.trim().trim_end_matches('/');
    if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{raw}.search.windows.net")
    }
}

#[async_trait]
impl SearchBackend for AzureSearchClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let request = SearchRequest {
            search: query,
            top: limit,
            select: (!self.select.is_empty()).then(|| self.select.join(",")),
        };

        let response = self
            .client
            .post(self.search_url())
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::Search(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RagError::Search(format!(
                "Search service returned {status}: {error_text}"
            )));
        }

        let result: SearchResponse = response
            .json()
            .await
            .map_err(|e| RagError::Search(format!("Failed to parse response: {e}")))?;

        tracing::debug!(
            index = %self.index_name,
            hits = result.value.len(),
            "search completed"
        );

        Ok(result.value)
    }

    fn name(&self) -> &str {
        "azure-search"
    }
}
