//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use tempfile::TempDir;

use studybuddy_rag::providers::GenerationRequest;
use studybuddy_rag::{EmbeddingProvider, Error, LlmProvider, Providers, RagConfig, Result, StudyBuddyEngine};

/// Vocabulary the keyword embedder counts
const VOCABULARY: [&str; 6] = ["cell", "energy", "water", "plant", "history", "war"];

/// Embeds text as keyword counts so retrieval is deterministic
pub struct KeywordEmbedder;

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lower = text.to_lowercase();
        Ok(VOCABULARY
            .iter()
            .map(|w| lower.matches(w).count() as f32 + 0.01)
            .collect())
    }

    fn name(&self) -> &str {
        "keywords"
    }
}

/// Returns a fixed answer and fixed tips, or fails on demand
pub struct ScriptedLlm {
    pub answer: Option<String>,
    pub tips: String,
}

impl ScriptedLlm {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            tips: "1. Make flashcards\n2. Explain it aloud\n3. Draw a diagram\n4. Extra".to_string(),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            tips: String::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        if request.system.is_some() {
            return Ok(self.tips.clone());
        }
        self.answer
            .clone()
            .ok_or_else(|| Error::QuotaExceeded("insufficient_quota".to_string()))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.answer.is_some())
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}

/// Configuration rooted in a temporary directory
pub fn test_config(dir: &TempDir) -> RagConfig {
    let mut config = RagConfig::default();
    config.documents.documents_dir = dir.path().join("documents");
    config.vector_db.storage_dir = dir.path().join("vector_db");
    config.llm.api_key = Some("sk-test".to_string());
    config
}

/// Engine with deterministic providers
pub fn engine_with(dir: &TempDir, llm: ScriptedLlm) -> Arc<StudyBuddyEngine> {
    let providers = Providers {
        embedder: Arc::new(KeywordEmbedder),
        llm: Arc::new(llm),
    };
    Arc::new(StudyBuddyEngine::new(test_config(dir), providers).expect("engine should build"))
}

/// Write a file into the test documents directory
pub fn write_document(dir: &TempDir, name: &str, content: &str) {
    let docs = dir.path().join("documents");
    std::fs::create_dir_all(&docs).expect("create documents dir");
    std::fs::write(docs.join(name), content).expect("write document");
}
