//! Liveness, health and security probes
//!
//! None of these responses ever echo a configured value, only whether it
//! is present.
//!
//! Author: hephaex@gmail.com

use crate::state::AppContext;
use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;

/// Root response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RootResponse {
    #[schema(example = "Wine RAG API is running!")]
    pub message: String,
    #[schema(example = "healthy")]
    pub status: String,
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses(
        (status = 200, description = "Service is alive", body = RootResponse)
    )
)]
pub async fn root() -> impl IntoResponse {
    Json(RootResponse {
        message: "Wine RAG API is running!".to_string(),
        status: "healthy".to_string(),
    })
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// `initialized` or `failed`
    pub openai_client: String,
    /// `initialized` or `failed`
    pub search_client: String,
    /// Variable name to `set` or `missing`
    pub environment: BTreeMap<String, String>,
    pub security_status: SecurityStatus,
    pub ssl_info: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SecurityStatus {
    pub api_key_required: bool,
    pub security_headers: String,
    pub docs_enabled: bool,
}

fn client_status(initialized: bool) -> String {
    let status = if initialized { "initialized" } else { "failed" };
    status.to_string()
}

fn presence(set: bool) -> String {
    let value = if set { "set" } else { "missing" };
    value.to_string()
}

/// Health check with client and configuration status
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Initialization status", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppContext>>) -> impl IntoResponse {
    let environment = state
        .config
        .env_presence
        .entries()
        .into_iter()
        .map(|(name, set)| (name.to_string(), presence(set)))
        .collect();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_secs(),
        openai_client: client_status(state.completion_client.is_some()),
        search_client: client_status(state.search_client.is_some()),
        environment,
        security_status: SecurityStatus {
            api_key_required: state.config.auth.is_required(),
            security_headers: "enabled".to_string(),
            docs_enabled: state.config.server.environment.docs_enabled(),
        },
        ssl_info: "TLS terminated by hosting platform".to_string(),
    })
}

/// Security configuration response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SecurityTestResponse {
    pub api_key_in_env: bool,
    #[schema(example = "production")]
    pub environment: String,
    pub docs_enabled: bool,
}

/// Report the security configuration without revealing secrets
#[utoipa::path(
    get,
    path = "/security-test",
    tag = "health",
    responses(
        (status = 200, description = "Security configuration", body = SecurityTestResponse)
    )
)]
pub async fn security_test(State(state): State<Arc<AppContext>>) -> impl IntoResponse {
    let environment = state.config.server.environment;
    Json(SecurityTestResponse {
        api_key_in_env: state.config.auth.is_required(),
        environment: environment.to_string(),
        docs_enabled: environment.docs_enabled(),
    })
}
