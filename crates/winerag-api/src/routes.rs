//! API route definitions
//!
//! Author: hephaex@gmail.com

use crate::handlers::{ask, health};
use crate::middleware::api_key_middleware;
use crate::state::AppContext;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Routes open to everyone
pub fn public_routes() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/security-test", get(health::security_test))
        .route("/ask-public", post(ask::ask_public_handler))
}

/// Routes behind the API key gate
pub fn protected_routes(state: Arc<AppContext>) -> Router<Arc<AppContext>> {
    Router::new()
        .route("/ask", post(ask::ask_handler))
        .route("/chat", post(ask::chat_handler))
        .route_layer(middleware::from_fn_with_state(state, api_key_middleware))
}
