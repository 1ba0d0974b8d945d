//! Wine RAG Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout the service:
//! - Search result and chat message models
//! - Common error types
//! - Shared traits for the search and completion backends
//! - Configuration management

pub mod config;

pub use config::{
    AppConfig, AuthConfig, ConfigError, ContextPolicy, EnvPresence, Environment, LlmConfig,
    LoggingConfig, RagConfig, SearchConfig, ServerConfig,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for RAG operations
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Search error: {0}")]
    Search(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("{stage} call timed out after {secs}s")]
    Timeout { stage: &'static str, secs: u64 },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RagError>;

// ============================================================================
// Search Models
// ============================================================================

/// A single document returned by the search service
///
/// Only `content` is interpreted. Anything else the service sends back
/// (scores, highlights, extra selected fields) is kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Document text
    pub content: String,

    /// Remaining fields, untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SearchResult {
    /// Create a result holding only `content`
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            extra: serde_json::Map::new(),
        }
    }

    /// Attach an additional field
    pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

// ============================================================================
// Chat Models
// ============================================================================

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single message in a chat completion conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Trait for search backends
#[async_trait::async_trait]
pub trait SearchBackend: Send + Sync {
    /// Search for documents matching `query`, in the order the backend ranks them
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Trait for chat completion clients
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send a conversation and return the first choice's text
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Get client name for logging
    fn name(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================
