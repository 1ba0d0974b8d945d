//! API error handling
//!
//! Author: hephaex@gmail.com

use crate::middleware::api_key::{API_KEY_CHALLENGE, API_KEY_HEADER};
use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use winerag_core::RagError;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code
    #[schema(example = "UPSTREAM_ERROR")]
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing and wrong keys are reported identically
    #[error("invalid or missing API key")]
    Unauthorized,

    #[error("Clients not properly initialized")]
    NotInitialized,

    #[error("RAG processing failed: {0}")]
    Upstream(String),

    #[error("{0}")]
    Timeout(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::NotInitialized | AppError::Upstream(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::NotInitialized => "NOT_INITIALIZED",
            AppError::Upstream(_) => "UPSTREAM_ERROR",
            AppError::Timeout(_) => "UPSTREAM_TIMEOUT",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = match &self {
            AppError::Unauthorized => ApiError::new(
                self.error_code(),
                format!("Invalid or missing API key. Provide it in the {API_KEY_HEADER} header."),
            ),
            AppError::Internal(msg) => {
                ApiError::new(self.error_code(), "Internal server error").with_details(msg.clone())
            }
            _ => ApiError::new(self.error_code(), self.to_string()),
        };

        let mut response = (status, Json(error)).into_response();
        if matches!(self, AppError::Unauthorized) {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(API_KEY_CHALLENGE),
            );
        }
        response
    }
}

impl From<RagError> for AppError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::Search(_) | RagError::Llm(_) => AppError::Upstream(err.to_string()),
            RagError::Timeout { .. } => AppError::Timeout(err.to_string()),
            RagError::Config(msg) => AppError::Internal(format!("Configuration error: {msg}")),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}
