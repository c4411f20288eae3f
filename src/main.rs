//! todo-agent - HTTP Server Entry Point
//!
//! Starts the HTTP server that exposes the agent API.

use todo_agent::{api, config::Config};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_agent=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Loaded configuration: default provider={}, ollama model={}",
        config.default_provider, config.llm.ollama_model
    );
    if config.llm.openai_api_key.is_none() {
        warn!("OPENAI_API_KEY not set; the openai provider will be unavailable");
    }
    if config.llm.hf_api_key.is_none() {
        warn!("HF_API_KEY not set; the hf provider will be unavailable");
    }

    api::serve(config).await?;

    Ok(())
}
