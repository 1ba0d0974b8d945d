//! Wine RAG API - HTTP server
//!
//! Exposes the RAG pipeline over HTTP, with a shared-secret gate on the
//! protected routes and security headers on every response.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::api_key::API_KEY_HEADER;
use crate::middleware::security_headers_middleware;
use crate::state::AppContext;

#[cfg(feature = "test-utils")]
pub use testing::create_router_for_testing;

/// OpenAPI document for the service
#[derive(OpenApi)]
#[openapi(
    info(title = "Wine RAG API", description = "Wine recommendation system using RAG"),
    paths(
        handlers::health::root,
        handlers::health::health_check,
        handlers::health::security_test,
        handlers::ask::ask_handler,
        handlers::ask::chat_handler,
        handlers::ask::ask_public_handler,
    ),
    components(schemas(
        handlers::ask::ChatRequest,
        handlers::ask::ChatResponse,
        handlers::health::RootResponse,
        handlers::health::HealthResponse,
        handlers::health::SecurityStatus,
        handlers::health::SecurityTestResponse,
        error::ApiError,
    )),
    modifiers(&ApiKeyAddon),
    tags(
        (name = "health", description = "Liveness and configuration probes"),
        (name = "rag", description = "Question answering")
    )
)]
pub struct ApiDoc;

struct ApiKeyAddon;

impl Modify for ApiKeyAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(API_KEY_HEADER))),
            );
        }
    }
}

/// Build the full application router
pub fn create_router(state: Arc<AppContext>) -> Router {
    let mut router = Router::new()
        .merge(routes::public_routes())
        .merge(routes::protected_routes(state.clone()));

    if state.config.server.environment.docs_enabled() {
        router = router.merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()));
    }

    router
        .layer(cors_layer(&state.config.server.cors_origins))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-api-key")])
}
