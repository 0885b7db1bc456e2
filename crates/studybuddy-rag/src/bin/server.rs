//! StudyBuddy server binary
//!
//! Run with: cargo run -p studybuddy-rag --bin studybuddy-server
//!
//! Set `STUDYBUDDY_CONFIG` to read a TOML file; `STUDYBUDDY_*` variables and
//! `OPENAI_API_KEY` override it.

use std::path::PathBuf;
use std::sync::Arc;

use studybuddy_rag::{config::RagConfig, engine::StudyBuddyEngine, server::RagServer, LlmProvider, Providers};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studybuddy_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var_os("STUDYBUDDY_CONFIG").map(PathBuf::from);
    let config = RagConfig::load(config_path.as_deref())?;
    config.validate()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Backend: {:?}", config.backend);
    tracing::info!("  - Model: {}", config.llm.model);
    tracing::info!("  - Embedding model: {}", config.llm.embed_model_for(config.backend));
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );
    tracing::info!("  - Documents: {}", config.documents.documents_dir.display());

    let providers = Providers::from_config(&config)?;
    if !providers.llm.health_check().await.unwrap_or(false) {
        tracing::warn!(
            "{} backend at {} is not reachable; answers will fail until it is",
            providers.llm.name(),
            config.llm.base_url_for(config.backend)
        );
    }

    let engine = Arc::new(StudyBuddyEngine::new(config, providers)?);
    let report = engine.initialize().await?;
    for (path, reason) in &report.failed {
        tracing::warn!("Not indexed: {} ({})", path.display(), reason);
    }

    let server = RagServer::new(engine);
    tracing::info!("  API: http://{}/api/v1", server.address());
    server.start().await?;

    Ok(())
}
