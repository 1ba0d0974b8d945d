//! RAG question handlers
//!
//! `/ask` and `/chat` sit behind the API key gate, `/ask-public` does not.
//! All three run the same pipeline.
//!
//! Author: hephaex@gmail.com

use crate::error::AppError;
use crate::state::AppContext;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Question request body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    /// User's question, passed to search as-is
    #[schema(example = "What is the best Cabernet Sauvignon?")]
    pub message: String,
}

/// Answer response body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    /// Model output, verbatim
    pub response: String,
}

async fn answer(
    state: Arc<AppContext>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(req) = payload?;
    let rag = state.rag()?;

    let response = rag.ask(&req.message).await?;

    Ok(Json(ChatResponse { response }))
}

/// Answer a question (API key required when configured)
#[utoipa::path(
    post,
    path = "/ask",
    tag = "rag",
    request_body = ChatRequest,
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Answer generated", body = ChatResponse),
        (status = 400, description = "Invalid request", body = crate::error::ApiError),
        (status = 401, description = "Missing or invalid API key", body = crate::error::ApiError),
        (status = 500, description = "Upstream or initialization failure", body = crate::error::ApiError),
        (status = 504, description = "Upstream timeout", body = crate::error::ApiError)
    )
)]
pub async fn ask_handler(
    State(state): State<Arc<AppContext>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    answer(state, payload).await
}

/// Alias of `/ask`
#[utoipa::path(
    post,
    path = "/chat",
    tag = "rag",
    request_body = ChatRequest,
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Answer generated", body = ChatResponse),
        (status = 401, description = "Missing or invalid API key", body = crate::error::ApiError),
        (status = 500, description = "Upstream or initialization failure", body = crate::error::ApiError)
    )
)]
pub async fn chat_handler(
    State(state): State<Arc<AppContext>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    answer(state, payload).await
}

/// Answer a question without authentication
#[utoipa::path(
    post,
    path = "/ask-public",
    tag = "rag",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Answer generated", body = ChatResponse),
        (status = 400, description = "Invalid request", body = crate::error::ApiError),
        (status = 500, description = "Upstream or initialization failure", body = crate::error::ApiError),
        (status = 504, description = "Upstream timeout", body = crate::error::ApiError)
    )
)]
pub async fn ask_public_handler(
    State(state): State<Arc<AppContext>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    answer(state, payload).await
}
