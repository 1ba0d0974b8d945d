//! Wine RAG CLI - Command-line interface
//!
//! Usage:
//!   winerag ask <question>
//!   winerag smoke --url <base-url> [--api-key <key>]

mod smoke;

use clap::{Parser, Subcommand};
use std::sync::Arc;
use winerag_core::AppConfig;
use winerag_rag::{OpenAiChatClient, RagPipeline};
use winerag_search::AzureSearchClient;

#[derive(Parser)]
#[command(name = "winerag")]
#[command(about = "Wine recommendation RAG command-line tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question using the search and completion services directly
    Ask {
        /// Question to ask
        question: String,

        /// Also print the context handed to the model
        #[arg(long)]
        show_context: bool,
    },
    /// Check a deployed service end to end
    Smoke {
        /// Base URL of the deployment
        #[arg(long, env = "WINERAG_URL")]
        url: String,

        /// Shared secret for the protected routes
        #[arg(long, env = "API_KEY")]
        api_key: Option<String>,

        /// Question sent to the answer routes
        #[arg(long, default_value = "What is the best Cabernet Sauvignon?")]
        message: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ask {
            question,
            show_context,
        } => {
            let config = AppConfig::from_env()?;
            let search = AzureSearchClient::from_config(&config.search)?;
            let completion = OpenAiChatClient::from_config(&config.llm)?;
            let pipeline = RagPipeline::new(Arc::new(search), Arc::new(completion))
                .with_config(&config.rag, &config.search);

            let result = pipeline.run(&question).await?;
            tracing::debug!(hits = result.hits, policy = %pipeline.policy(), "answer ready");
            if show_context {
                println!("--- context ({} hits) ---\n{}\n---", result.hits, result.context);
            }
            println!("{}", result.answer);
        }
        Commands::Smoke {
            url,
            api_key,
            message,
        } => {
            let client = reqwest::Client::new();
            let report = smoke::run(&client, &url, api_key.as_deref(), &message).await?;

            for check in &report.checks {
                let mark = if check.passed { "PASS" } else { "FAIL" };
                println!("[{mark}] {} ({})", check.name, check.detail);
            }
            if !report.security_headers.is_empty() {
                println!("Security headers:");
                for (name, value) in &report.security_headers {
                    println!("  {name}: {value}");
                }
            }

            if !report.all_passed() {
                anyhow::bail!("smoke test failed against {url}");
            }
        }
    }

    Ok(())
}
