//! Chat completion client
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint, including
//! Azure OpenAI's v1 surface.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use winerag_core::{ChatMessage, CompletionClient, LlmConfig, RagError, Result};

/// Persona sent as the system message of every conversation
pub const SYSTEM_PERSONA: &str =
    "Assistant is a chatbot that helps you find the best wine for your taste.";

/// Build the fixed three-message conversation for one question
///
/// The retrieved context rides in an assistant-role message, matching the
/// prompt shape of the deployed service.
pub fn build_messages(question: &str, context: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PERSONA),
        ChatMessage::user(question),
        ChatMessage::assistant(context),
    ]
}

// ============================================================================
// OpenAI Client
// ============================================================================

/// OpenAI-compatible chat completion client
pub struct OpenAiChatClient {
    client: Client,
    api_key: String,
    base_url: String,
    params: CompletionParams,
}

/// Sampling parameters sent with every request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl From<&LlmConfig> for CompletionParams {
    fn from(config: &LlmConfig) -> Self {
        Self {
            model: config.deployment.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            top_p: config.top_p,
            frequency_penalty: config.frequency_penalty,
            presence_penalty: config.presence_penalty,
        }
    }
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self::from(&LlmConfig::default())
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
    stop: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiChatClient {
    /// Create a new client with default sampling parameters
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            params: CompletionParams::default(),
        }
    }

    /// Create from config
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_ref()
            .ok_or_else(|| RagError::Config("OPENAI_API_KEY is required".to_string()))?;

        Ok(Self::new(api_key.clone(), config.base_url.clone())
            .with_params(CompletionParams::from(config)))
    }

    /// Replace the sampling parameters
    pub fn with_params(mut self, params: CompletionParams) -> Self {
        self.params = params;
        self
    }
}

#[async_trait]
impl CompletionClient for OpenAiChatClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.params.model,
            messages,
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
            top_p: self.params.top_p,
            frequency_penalty: self.params.frequency_penalty,
            presence_penalty: self.params.presence_penalty,
            stop: None,
        };

        // Azure accepts `api-key`, everything else `Authorization`
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::Llm(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RagError::Llm(format!(
                "Completion service returned {status}: {error_text}"
            )));
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| RagError::Llm(format!("Failed to parse response: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| RagError::Llm("No response generated".to_string()))
    }

    fn name(&self) -> &str {
        "openai-chat"
    }
}

// ============================================================================
// Tests
// ============================================================================
