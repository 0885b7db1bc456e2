//! Configuration for the StudyBuddy engine
//!
//! Settings come from built-in defaults, an optional TOML file, and
//! `STUDYBUDDY_*` environment variables, in that order of precedence.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "STUDYBUDDY_";

/// Hard upper bound on sources per question
pub const MAX_SOURCES_LIMIT: usize = 10;

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RagConfig {
    /// Backend provider for embeddings and generation
    pub backend: BackendProvider,
    /// Server configuration
    pub server: ServerConfig,
    /// Documents directory and accepted formats
    pub documents: DocumentsConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// LLM configuration
    pub llm: LlmConfig,
    /// Vector index configuration
    pub vector_db: VectorDbConfig,
}

/// Backend provider selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendProvider {
    /// OpenAI-compatible chat completions + embeddings API
    #[default]
    OpenAi,
    /// Local Ollama server
    Ollama,
}

impl std::str::FromStr for BackendProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(Error::Config(format!("Unknown backend: {}", other))),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Application name shown in the root banner
    pub app_name: String,
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Allowed CORS origins (empty = any)
    pub cors_origins: Vec<String>,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            app_name: "StudyBuddy".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

/// Documents directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    /// Directory scanned at startup and receiving uploads
    pub documents_dir: PathBuf,
    /// Accepted extensions, with leading dot (".pdf")
    pub supported_extensions: Vec<String>,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            documents_dir: PathBuf::from("documents"),
            supported_extensions: vec![".pdf".to_string(), ".txt".to_string(), ".md".to_string()],
        }
    }
}

impl DocumentsConfig {
    /// Check whether a file name or path carries a supported extension
    pub fn is_supported(&self, path: impl AsRef<Path>) -> bool {
        extension_of(path.as_ref())
            .map(|ext| {
                self.supported_extensions
                    .iter()
                    .any(|s| normalize_extension(s) == ext)
            })
            .unwrap_or(false)
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Overlap between adjacent chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Sources retrieved when the request does not say
    pub max_sources: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { max_sources: 3 }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key (required for the OpenAI backend)
    pub api_key: Option<String>,
    /// Base URL override; defaults depend on the backend
    pub base_url: Option<String>,
    /// Generation model name
    pub model: String,
    /// Embedding model override; defaults depend on the backend
    pub embed_model: Option<String>,
    /// Temperature for answer generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for transient failures
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: "gpt-4o-mini".to_string(),
            embed_model: None,
            temperature: 0.7,
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

impl LlmConfig {
    /// Effective base URL for a backend
    pub fn base_url_for(&self, backend: BackendProvider) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => match backend {
                BackendProvider::OpenAi => "https://api.openai.com/v1".to_string(),
                BackendProvider::Ollama => "http://localhost:11434".to_string(),
            },
        }
    }

    /// Effective embedding model for a backend
    pub fn embed_model_for(&self, backend: BackendProvider) -> String {
        match &self.embed_model {
            Some(model) => model.clone(),
            None => match backend {
                BackendProvider::OpenAi => "text-embedding-3-small".to_string(),
                BackendProvider::Ollama => "nomic-embed-text".to_string(),
            },
        }
    }
}

/// Vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    /// Directory holding the persisted index and document registry
    pub storage_dir: PathBuf,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("vector_db"),
        }
    }
}

impl VectorDbConfig {
    /// Path of the persisted vector index
    pub fn index_path(&self) -> PathBuf {
        self.storage_dir.join("index.json")
    }

    /// Path of the persisted document registry
    pub fn registry_path(&self) -> PathBuf {
        self.storage_dir.join("registry.json")
    }
}

impl RagConfig {
    /// Load configuration from an optional TOML file plus the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse TOML configuration text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid configuration: {}", e)))
    }

    /// Apply `STUDYBUDDY_*` overrides (plus `OPENAI_API_KEY`) through `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(v) = var("BACKEND") {
            self.backend = v.parse()?;
        }
        if let Some(v) = var("HOST") {
            self.server.host = v;
        }
        if let Some(v) = var("PORT") {
            self.server.port = parse_env("PORT", &v)?;
        }
        if let Some(v) = var("DOCUMENTS_DIR") {
            self.documents.documents_dir = PathBuf::from(v);
        }
        if let Some(v) = var("VECTOR_DB_DIR") {
            self.vector_db.storage_dir = PathBuf::from(v);
        }
        if let Some(v) = var("SUPPORTED_EXTENSIONS") {
            self.documents.supported_extensions = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| format!(".{}", normalize_extension(s)))
                .collect();
        }
        if let Some(v) = var("CHUNK_SIZE") {
            self.chunking.chunk_size = parse_env("CHUNK_SIZE", &v)?;
        }
        if let Some(v) = var("CHUNK_OVERLAP") {
            self.chunking.chunk_overlap = parse_env("CHUNK_OVERLAP", &v)?;
        }
        if let Some(v) = var("MAX_SOURCES") {
            self.retrieval.max_sources = parse_env("MAX_SOURCES", &v)?;
        }
        if let Some(v) = var("OPENAI_MODEL").or_else(|| var("MODEL")) {
            self.llm.model = v;
        }
        if let Some(v) = var("OPENAI_TEMPERATURE").or_else(|| var("TEMPERATURE")) {
            self.llm.temperature = parse_env("TEMPERATURE", &v)?;
        }
        if let Some(v) = var("EMBED_MODEL") {
            self.llm.embed_model = Some(v);
        }
        if let Some(v) = var("BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Some(v) = var("TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_env("TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = var("MAX_RETRIES") {
            self.llm.max_retries = parse_env("MAX_RETRIES", &v)?;
        }
        if let Some(v) = lookup("OPENAI_API_KEY").or_else(|| var("OPENAI_API_KEY")) {
            self.llm.api_key = Some(v);
        }

        Ok(())
    }

    /// Check settings that would make the service unusable
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be greater than 0".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.max_sources == 0 || self.retrieval.max_sources > MAX_SOURCES_LIMIT {
            return Err(Error::Config(format!(
                "max_sources must be between 1 and {}",
                MAX_SOURCES_LIMIT
            )));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(Error::Config("temperature must be between 0.0 and 2.0".to_string()));
        }
        if self.documents.supported_extensions.is_empty() {
            return Err(Error::Config("supported_extensions must not be empty".to_string()));
        }
        if self.backend == BackendProvider::OpenAi
            && self.llm.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
        {
            return Err(Error::Config(
                "OPENAI_API_KEY environment variable is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Lowercase extension of a path without the leading dot
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Normalize ".PDF" / "pdf" to "pdf"
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        Error::Config(format!("Invalid value for {}{}: {}", ENV_PREFIX, name, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RagConfig::default();
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.retrieval.max_sources, 3);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.backend, BackendProvider::OpenAi);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let config = RagConfig::default();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = RagConfig::default();
        config.llm.api_key = Some("sk-test".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let mut config = RagConfig::default();
        config.backend = BackendProvider::Ollama;
        assert!(config.validate().is_ok());
        assert_eq!(config.llm.base_url_for(config.backend), "http://localhost:11434");
        assert_eq!(config.llm.embed_model_for(config.backend), "nomic-embed-text");
    }

    #[test]
    fn test_overlap_must_be_smaller() {
        let mut config = RagConfig::default();
        config.llm.api_key = Some("sk-test".to_string());
        config.chunking.chunk_overlap = 1000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = RagConfig::default();
        config
            .apply_env_overrides(env(&[
                ("STUDYBUDDY_CHUNK_SIZE", "500"),
                ("STUDYBUDDY_CHUNK_OVERLAP", "50"),
                ("STUDYBUDDY_MAX_SOURCES", "5"),
                ("STUDYBUDDY_OPENAI_MODEL", "gpt-4o"),
                ("STUDYBUDDY_SUPPORTED_EXTENSIONS", "pdf, .MD"),
                ("STUDYBUDDY_BACKEND", "ollama"),
                ("OPENAI_API_KEY", "sk-env"),
            ]))
            .unwrap();

        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.chunk_overlap, 50);
        assert_eq!(config.retrieval.max_sources, 5);
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.documents.supported_extensions, vec![".pdf", ".md"]);
        assert_eq!(config.backend, BackendProvider::Ollama);
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-env"));
    }

    #[test]
    fn test_bad_env_value() {
        let mut config = RagConfig::default();
        let result = config.apply_env_overrides(env(&[("STUDYBUDDY_PORT", "eighty")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_from_toml_partial() {
        let config = RagConfig::from_toml(
            r#"
            backend = "ollama"

            [chunking]
            chunk_size = 800

            [llm]
            model = "llama3.2:3b"
            temperature = 0.2
            "#,
        )
        .unwrap();

        assert_eq!(config.backend, BackendProvider::Ollama);
        assert_eq!(config.chunking.chunk_size, 800);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.llm.model, "llama3.2:3b");
        assert_eq!(config.retrieval.max_sources, 3);
    }

    #[test]
    fn test_supported_extensions() {
        let docs = DocumentsConfig::default();
        assert!(docs.is_supported("notes.md"));
        assert!(docs.is_supported("Lecture.PDF"));
        assert!(!docs.is_supported("notes.csv"));
        assert!(!docs.is_supported("README"));
    }
}
