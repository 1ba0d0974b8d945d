//! Configuration Management
//!
//! Handles configuration from environment variables and TOML files,
//! with sensible defaults for development.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variables reported by the health probe
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const SEARCH_SERVICE_NAME: &str = "SEARCH_SERVICE_NAME";
pub const SEARCH_API_KEY: &str = "SEARCH_API_KEY";
pub const SEARCH_INDEX_NAME: &str = "SEARCH_INDEX_NAME";
pub const API_KEY: &str = "API_KEY";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Search service configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Completion service configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// RAG pipeline configuration
    #[serde(default)]
    pub rag: RagConfig,

    /// Shared-secret gate
    #[serde(default)]
    pub auth: AuthConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Which well-known variables were present in the process environment
    #[serde(skip)]
    pub env_presence: EnvPresence,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().apply_env(lookup)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })?;

        Ok(config.normalized())
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        self.env_presence = EnvPresence {
            openai_api_key: get(OPENAI_API_KEY).is_some(),
            search_service_name: get(SEARCH_SERVICE_NAME).is_some(),
            search_api_key: get(SEARCH_API_KEY).is_some(),
            search_index_name: get(SEARCH_INDEX_NAME).is_some(),
            api_key: get(API_KEY).is_some(),
        };

        // Server
        if let Some(host) = get("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("API_PORT") {
            self.server.port = parse_value("API_PORT", &port)?;
        }
        if let Some(env) = get("ENVIRONMENT") {
            self.server.environment = env.parse()?;
        }
        if let Some(origins) = get("CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Search
        if let Some(service) = get(SEARCH_SERVICE_NAME) {
            self.search.service = Some(service);
        }
        if let Some(key) = get(SEARCH_API_KEY) {
            self.search.api_key = Some(key);
        }
        if let Some(index) = get(SEARCH_INDEX_NAME) {
            self.search.index_name = index;
        }
        if let Some(version) = get("SEARCH_API_VERSION") {
            self.search.api_version = version;
        }

        // LLM
        if let Some(key) = get(OPENAI_API_KEY) {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(deployment) = get("OPENAI_DEPLOYMENT") {
            self.llm.deployment = deployment;
        }

        // RAG
        if let Some(policy) = get("CONTEXT_POLICY") {
            self.rag.context_policy = policy.parse()?;
        }
        if let Some(secs) = get("UPSTREAM_TIMEOUT_SECS") {
            self.rag.upstream_timeout_secs = parse_value("UPSTREAM_TIMEOUT_SECS", &secs)?;
        }

        // Auth
        if let Some(key) = get(API_KEY) {
            self.auth.api_key = Some(key);
        }

        // Logging
        if let Some(level) = get("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = get("LOG_FORMAT") {
            self.logging.json_format = format.eq_ignore_ascii_case("json");
        }

        Ok(self.normalized())
    }

    /// Blank secrets count as unset, whichever source they came from
    fn normalized(mut self) -> Self {
        self.auth.api_key = self.auth.api_key.take().filter(|k| !k.trim().is_empty());
        self.search.api_key = self.search.api_key.take().filter(|k| !k.trim().is_empty());
        self.llm.api_key = self.llm.api_key.take().filter(|k| !k.trim().is_empty());
        self
    }

    /// Socket address string to bind to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Deployment mode
    pub environment: Environment,

    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            environment: Environment::Development,
            // Empty by default - set via CORS_ORIGINS env var
            cors_origins: vec![],
        }
    }
}

/// Deployment mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Interactive API docs are only served outside production
    pub fn docs_enabled(&self) -> bool {
        !matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" | "local" | "test" | "staging" => Ok(Self::Development),
            _ => Err(ConfigError::InvalidValue {
                key: "ENVIRONMENT".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Search service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Endpoint URL or bare service name
    pub service: Option<String>,

    /// Admin or query key
    pub api_key: Option<String>,

    /// Index to query
    pub index_name: String,

    /// REST api-version
    pub api_version: String,

    /// Maximum number of candidates requested
    pub top: usize,

    /// Fields returned for each hit
    pub select: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            service: None,
            api_key: None,
            index_name: "demo-index".to_string(),
            api_version: "2023-11-01".to_string(),
            top: 20,
            select: vec!["content".to_string()],
        }
    }
}

/// Completion service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key
    pub api_key: Option<String>,

    /// API base URL (OpenAI, Azure OpenAI, or any compatible API)
    pub base_url: String,

    /// Model or deployment name
    pub deployment: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens for completion
    pub max_tokens: u32,

    /// Nucleus sampling
    pub top_p: f32,

    pub frequency_penalty: f32,

    pub presence_penalty: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            deployment: "gpt-35-turbo-2".to_string(),
            temperature: 0.7,
            max_tokens: 4096,
            top_p: 0.95,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

/// RAG pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// How search results become the prompt context
    pub context_policy: ContextPolicy,

    /// Timeout applied to each outbound call
    pub upstream_timeout_secs: u64,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            context_policy: ContextPolicy::FirstResult,
            upstream_timeout_secs: 60,
        }
    }
}

/// Strategy for reducing search results to a context string
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContextPolicy {
    /// Content of the top-ranked result only
    #[default]
    FirstResult,
    /// Render the entire result list as-is
    StringifyAll,
}

impl std::fmt::Display for ContextPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FirstResult => write!(f, "first-result"),
            Self::StringifyAll => write!(f, "stringify-all"),
        }
    }
}

impl std::str::FromStr for ContextPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "first-result" | "first" => Ok(Self::FirstResult),
            "stringify-all" | "all" => Ok(Self::StringifyAll),
            _ => Err(ConfigError::InvalidValue {
                key: "CONTEXT_POLICY".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Shared-secret gate configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Expected value of the `X-API-Key` header; `None` leaves the gate open
    pub api_key: Option<String>,
}

impl AuthConfig {
    pub fn is_required(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Presence (never the value) of the variables the health probe reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvPresence {
    pub openai_api_key: bool,
    pub search_service_name: bool,
    pub search_api_key: bool,
    pub search_index_name: bool,
    pub api_key: bool,
}

impl EnvPresence {
    /// Pairs of variable name and presence, in report order
    pub fn entries(&self) -> [(&'static str, bool); 5] {
        [
            (OPENAI_API_KEY, self.openai_api_key),
            (SEARCH_SERVICE_NAME, self.search_service_name),
            (SEARCH_API_KEY, self.search_api_key),
            (SEARCH_INDEX_NAME, self.search_index_name),
            (API_KEY, self.api_key),
        ]
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.search.top, 20);
        assert_eq!(config.search.select, vec!["content".to_string()]);
        assert_eq!(config.llm.max_tokens, 4096);
        assert!((config.llm.temperature - 0.7).abs() < f32::EPSILON);
        assert!((config.llm.top_p - 0.95).abs() < f32::EPSILON);
        assert_eq!(config.rag.context_policy, ContextPolicy::FirstResult);
        assert!(!config.auth.is_required());
    }

    #[test]
    fn test_from_lookup_reads_services() {
        let config = AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("SEARCH_SERVICE_NAME", "https://demo.search.windows.net"),
            ("SEARCH_API_KEY", "search-key"),
            ("API_KEY", "shared-secret"),
            ("API_PORT", "9000"),
        ]))
        .unwrap();

        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(
            config.search.service.as_deref(),
            Some("https://demo.search.windows.net")
        );
        assert_eq!(config.search.index_name, "demo-index");
        assert_eq!(config.auth.api_key.as_deref(), Some("shared-secret"));
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");

        assert!(config.env_presence.openai_api_key);
        assert!(config.env_presence.search_api_key);
        assert!(!config.env_presence.search_index_name);
    }

    #[test]
    fn test_empty_api_key_leaves_gate_open() {
        let config = AppConfig::from_lookup(lookup(&[("API_KEY", "")])).unwrap();
        assert!(!config.auth.is_required());
        assert!(!config.env_presence.api_key);
    }

    #[test]
    fn test_invalid_port_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("API_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "API_PORT"));
    }

    #[test]
    fn test_context_policy_parse() {
        assert_eq!(
            "first-result".parse::<ContextPolicy>().unwrap(),
            ContextPolicy::FirstResult
        );
        assert_eq!(
            "STRINGIFY_ALL".parse::<ContextPolicy>().unwrap(),
            ContextPolicy::StringifyAll
        );
        assert!("best-guess".parse::<ContextPolicy>().is_err());
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(
            "Production".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert!(!Environment::Production.docs_enabled());
        assert!(Environment::Development.docs_enabled());
        assert!("moon".parse::<Environment>().is_err());
    }

    #[test]
    fn test_toml_round_trip_with_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [rag]
            context_policy = "stringify-all"
            upstream_timeout_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.rag.context_policy, ContextPolicy::StringifyAll);
        assert_eq!(config.rag.upstream_timeout_secs, 5);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_blank_secret_in_file_leaves_gate_open() {
        let path = std::env::temp_dir().join(format!(
            "winerag-blank-secret-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[auth]\napi_key = \"\"\n\n[llm]\napi_key = \"  \"\n").unwrap();

        let config = AppConfig::from_file(path.clone()).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(!config.auth.is_required());
        assert_eq!(config.auth.api_key, None);
        assert_eq!(config.llm.api_key, None);
    }

    #[test]
    fn test_blank_secret_from_toml_with_empty_env() {
        let config: AppConfig = toml::from_str("[auth]\napi_key = \"\"").unwrap();
        let config = config.apply_env(|_| None).unwrap();

        assert!(!config.auth.is_required());
    }

    #[test]
    fn test_partial_toml_section_keeps_field_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [search]
            index_name = "wines"
            "#,
        )
        .unwrap();

        assert_eq!(config.search.index_name, "wines");
        assert_eq!(config.search.top, 20);
        assert_eq!(config.search.api_version, "2023-11-01");
    }
}
