//! Provider abstractions for embeddings, generation and vector storage
//!
//! Trait seams let the engine switch between the OpenAI-compatible API and a
//! local Ollama server, and let tests swap in deterministic fakes.

pub mod embedding;
pub mod llm;
pub mod local;
pub mod ollama;
pub mod openai;
pub mod retry;
pub mod vector_store;

use std::sync::Arc;

pub use embedding::EmbeddingProvider;
pub use llm::{GenerationRequest, LlmProvider};
pub use local::LocalVectorIndex;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
pub use retry::RetryPolicy;
pub use vector_store::{VectorIndex, VectorSearchResult};

use crate::config::{BackendProvider, RagConfig};
use crate::error::Result;

/// The model-facing providers the engine needs
#[derive(Clone)]
pub struct Providers {
    /// Embedding model used by the vector index
    pub embedder: Arc<dyn EmbeddingProvider>,
    /// Generative model used for answers and tips
    pub llm: Arc<dyn LlmProvider>,
}

impl Providers {
    /// Build providers for the configured backend
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        match config.backend {
            BackendProvider::OpenAi => {
                let client = Arc::new(OpenAiClient::new(&config.llm)?);
                tracing::info!("Using OpenAI-compatible backend (model: {})", config.llm.model);
                Ok(Self {
                    embedder: client.clone(),
                    llm: client,
                })
            }
            BackendProvider::Ollama => {
                let client = Arc::new(OllamaClient::new(&config.llm)?);
                tracing::info!("Using Ollama backend (model: {})", config.llm.model);
                Ok(Self {
                    embedder: client.clone(),
                    llm: client,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_backend_needs_key() {
        let config = RagConfig::default();
        assert!(Providers::from_config(&config).is_err());
    }

    #[test]
    fn test_ollama_backend() {
        let mut config = RagConfig::default();
        config.backend = BackendProvider::Ollama;
        config.llm.model = "phi3".to_string();
        let providers = Providers::from_config(&config).unwrap();
        assert_eq!(providers.llm.name(), "ollama");
        assert_eq!(providers.llm.model(), "phi3");
        assert_eq!(providers.embedder.name(), "nomic-embed-text");
    }
}
