//! Shared-secret API key gate
//!
//! Protected routes require the `X-API-Key` header to equal the configured
//! secret exactly. With no secret configured every request passes.
//!
//! The comparison is a plain string compare: no constant-time equality,
//! rate limiting or lockout.
//!
//! Author: hephaex@gmail.com

use crate::error::AppError;
use crate::state::AppContext;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Header carrying the shared secret
pub const API_KEY_HEADER: &str = "X-API-Key";

/// `WWW-Authenticate` value sent with every rejection
pub const API_KEY_CHALLENGE: &str = "ApiKey header=\"X-API-Key\"";

/// Check a presented key against the expected one
pub fn verify(expected: Option<&str>, provided: Option<&str>) -> Result<(), AppError> {
    match expected {
        None => Ok(()),
        Some(secret) if provided == Some(secret) => Ok(()),
        Some(_) => Err(AppError::Unauthorized),
    }
}

/// API key middleware
pub async fn api_key_middleware(
    State(state): State<Arc<AppContext>>,
    request: Request,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok());

    match verify(state.api_key(), provided) {
        Ok(()) => next.run(request).await,
        Err(e) => {
            tracing::warn!(
                path = %request.uri().path(),
                key_present = provided.is_some(),
                "rejected request without valid API key"
            );
            e.into_response()
        }
    }
}
