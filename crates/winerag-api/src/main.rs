//! Wine RAG API Server
//!
//! Author: hephaex@gmail.com

use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winerag_api::{create_router, state::AppContext};
use winerag_core::{AppConfig, LoggingConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine, the platform injects variables directly
    dotenvy::dotenv().ok();

    // Load configuration: optional TOML file, environment on top
    let config = match std::env::var("WINERAG_CONFIG") {
        Ok(path) => AppConfig::from_file(path)?.with_env_override()?,
        Err(_) => AppConfig::from_env()?,
    };

    init_tracing(&config.logging);

    let addr = config.bind_addr();
    let docs_enabled = config.server.environment.docs_enabled();

    // Create application state
    let state = Arc::new(AppContext::initialize(config));
    if state.rag.is_none() {
        tracing::error!("RAG routes will fail until the service is configured; see /health");
    }

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Wine RAG API starting on http://{}", addr);
    if docs_enabled {
        tracing::info!("Swagger UI available at http://{}/docs/", addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &logging.level;
        format!("winerag_api={level},winerag_rag={level},winerag_search={level},tower_http={level}")
            .into()
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
