//! The StudyBuddy engine: owns the index, registry, pipeline and synthesizer
//!
//! One engine is built at startup and shared behind an `Arc`. Questions are
//! answered concurrently without locking; every write to the index (startup
//! scan and uploads) goes through a single async mutex.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::AnswerSynthesizer;
use crate::ingestion::{IngestPipeline, ScanReport};
use crate::providers::{LlmProvider, LocalVectorIndex, Providers, VectorIndex};
use crate::registry::DocumentRegistry;
use crate::types::{AnswerResult, ChatRequest, HealthResponse, UploadResponse, DEFAULT_SUBJECT};

/// Retrieval-augmented tutoring engine
pub struct StudyBuddyEngine {
    config: RagConfig,
    index: Arc<dyn VectorIndex>,
    registry: Arc<DocumentRegistry>,
    pipeline: IngestPipeline,
    synthesizer: AnswerSynthesizer,
    ingest_lock: Mutex<()>,
    started_at: Instant,
}

impl StudyBuddyEngine {
    /// Build the engine with providers for the configured backend
    pub fn from_config(config: RagConfig) -> Result<Self> {
        let providers = Providers::from_config(&config)?;
        Self::new(config, providers)
    }

    /// Build the engine with explicit providers, opening the persisted index and registry
    pub fn new(config: RagConfig, providers: Providers) -> Result<Self> {
        let index: Arc<dyn VectorIndex> =
            Arc::new(LocalVectorIndex::open(config.vector_db.index_path(), providers.embedder)?);
        let registry = Arc::new(DocumentRegistry::open(config.vector_db.registry_path()));
        Ok(Self::with_parts(config, index, providers.llm, registry))
    }

    /// Assemble the engine from ready-made parts
    pub fn with_parts(
        config: RagConfig,
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn LlmProvider>,
        registry: Arc<DocumentRegistry>,
    ) -> Self {
        let pipeline = IngestPipeline::from_config(&config, index.clone(), registry.clone());
        let synthesizer = AnswerSynthesizer::new(index.clone(), llm, config.llm.temperature);

        Self {
            config,
            index,
            registry,
            pipeline,
            synthesizer,
            ingest_lock: Mutex::new(()),
            started_at: Instant::now(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Registry of ingested documents
    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    /// Ingest every new supported file in the documents directory
    pub async fn initialize(&self) -> Result<ScanReport> {
        let _guard = self.ingest_lock.lock().await;
        let report = self
            .pipeline
            .scan_directory(&self.config.documents.documents_dir)
            .await?;
        tracing::info!(
            "Engine ready: {} documents, {} indexed chunks",
            self.registry.len(),
            self.index.len().await?
        );
        Ok(report)
    }

    /// Answer a validated chat request
    pub async fn answer(&self, request: &ChatRequest) -> Result<AnswerResult> {
        request.validate()?;
        let max_sources = request.max_sources.unwrap_or(self.config.retrieval.max_sources);

        tracing::info!("Answering question ({} sources)", max_sources);
        let result = self.synthesizer.answer(&request.question, max_sources).await?;

        Ok(if request.include_sources {
            result
        } else {
            result.without_sources()
        })
    }

    /// Store an uploaded file under the default subject
    pub async fn upload(&self, filename: &str, bytes: &[u8]) -> Result<UploadResponse> {
        self.upload_with_subject(filename, bytes, DEFAULT_SUBJECT).await
    }

    /// Store an uploaded file in the documents directory and ingest it
    ///
    /// Unsupported extensions are refused before anything is written.
    pub async fn upload_with_subject(&self, filename: &str, bytes: &[u8], subject: &str) -> Result<UploadResponse> {
        let filename = sanitize_filename(filename)
            .ok_or_else(|| Error::Validation("upload must carry a file name".to_string()))?;

        if !self.config.documents.is_supported(&filename) || !self.pipeline.supports(Path::new(&filename)) {
            return Err(Error::UnsupportedFileType(format!(
                "Only {} files are supported",
                self.config.documents.supported_extensions.join(", ")
            )));
        }

        let dir = &self.config.documents.documents_dir;
        let path = dir.join(&filename);

        let _guard = self.ingest_lock.lock().await;
        tokio::fs::create_dir_all(dir).await?;
        let existed = tokio::fs::try_exists(&path).await.unwrap_or(false);
        tokio::fs::write(&path, bytes).await?;
        tracing::info!("Saved upload {} ({} bytes)", path.display(), bytes.len());

        match self.pipeline.ingest_with_subject(&path, subject).await {
            Ok(document) => Ok(UploadResponse {
                message: format!("Document {} uploaded and processed successfully", filename),
                filename,
                document,
            }),
            Err(e) => {
                tracing::error!("Failed to ingest upload {}: {}", filename, e);
                if !existed {
                    if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                        tracing::warn!("Could not remove failed upload {}: {}", path.display(), remove_err);
                    }
                }
                Err(e)
            }
        }
    }

    /// Service status and registered documents
    pub fn health(&self) -> HealthResponse {
        let documents = self.registry.list();
        HealthResponse {
            status: "healthy".to_string(),
            documents_count: documents.len(),
            documents,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

/// Reduce a client-supplied name to its final path component
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let last = raw.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default().trim();
    let name = PathBuf::from(last)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())?;
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{EmbeddingProvider, GenerationRequest};
    use async_trait::async_trait;
    use tempfile::{tempdir, TempDir};

    struct WordEmbedder;

    #[async_trait]
    impl EmbeddingProvider for WordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let lower = text.to_lowercase();
            Ok(["cell", "energy", "water", "history"]
                .iter()
                .map(|w| lower.matches(w).count() as f32 + 0.01)
                .collect())
        }

        fn name(&self) -> &str {
            "words"
        }
    }

    struct EchoLlm;

    #[async_trait]
    impl LlmProvider for EchoLlm {
        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            if request.system.is_some() {
                Ok("1. Reread\n2. Quiz".to_string())
            } else {
                Ok("Cells are the basic unit of life.".to_string())
            }
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo"
        }
    }

    fn engine(dir: &TempDir) -> StudyBuddyEngine {
        let mut config = RagConfig::default();
        config.documents.documents_dir = dir.path().join("documents");
        config.vector_db.storage_dir = dir.path().join("vector_db");
        StudyBuddyEngine::new(
            config,
            Providers {
                embedder: Arc::new(WordEmbedder),
                llm: Arc::new(EchoLlm),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("notes.md").as_deref(), Some("notes.md"));
        assert_eq!(sanitize_filename("../../etc/passwd.txt").as_deref(), Some("passwd.txt"));
        assert_eq!(sanitize_filename("C:\\Users\\me\\bio.pdf").as_deref(), Some("bio.pdf"));
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename("dir/"), None);
        assert_eq!(sanitize_filename(".."), None);
    }

    #[tokio::test]
    async fn test_initialize_then_answer() {
        let dir = tempdir().unwrap();
        let docs = dir.path().join("documents");
        std::fs::create_dir_all(&docs).unwrap();
        std::fs::write(docs.join("bio.md"), "The cell is the unit of life.").unwrap();
        std::fs::write(docs.join("history.txt"), "History of Rome.").unwrap();

        let engine = engine(&dir);
        let report = engine.initialize().await.unwrap();
        assert_eq!(report.ingested.len(), 2);

        let mut request = ChatRequest::new("What is a cell?");
        request.max_sources = Some(1);
        let result = engine.answer(&request).await.unwrap();
        assert_eq!(result.sources.len(), 1);
        assert_eq!(result.sources[0].filename, "bio.md");
        assert_eq!(result.study_tips, vec!["Reread", "Quiz"]);

        request.include_sources = false;
        assert!(engine.answer(&request).await.unwrap().sources.is_empty());
    }

    #[tokio::test]
    async fn test_answer_rejects_invalid_request() {
        let dir = tempdir().unwrap();
        let engine = engine(&dir);
        let result = engine.answer(&ChatRequest::new("")).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_restart_does_not_reingest() {
        let dir = tempdir().unwrap();
        let docs = dir.path().join("documents");
        std::fs::create_dir_all(&docs).unwrap();
        std::fs::write(docs.join("water.txt"), "Water boils at 100C.").unwrap();

        let first = engine(&dir);
        first.initialize().await.unwrap();
        drop(first);

        let second = engine(&dir);
        let report = second.initialize().await.unwrap();
        assert!(report.ingested.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(second.health().documents_count, 1);
    }

    #[tokio::test]
    async fn test_upload_ingests_file() {
        let dir = tempdir().unwrap();
        let engine = engine(&dir);

        let response = engine.upload("energy.md", b"Energy flows through cells.").await.unwrap();
        assert_eq!(response.filename, "energy.md");
        assert_eq!(response.document.chunk_count, 1);
        assert!(dir.path().join("documents").join("energy.md").exists());

        let health = engine.health();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.documents_count, 1);
        assert_eq!(health.documents[0].filename, "energy.md");
    }

    #[tokio::test]
    async fn test_upload_with_subject() {
        let dir = tempdir().unwrap();
        let engine = engine(&dir);

        let response = engine
            .upload_with_subject("cells.md", b"The cell is the unit of life.", "biology")
            .await
            .unwrap();
        assert_eq!(response.document.subject, "biology");
        assert_eq!(engine.health().documents[0].subject, "biology");
    }

    #[tokio::test]
    async fn test_upload_unsupported_writes_nothing() {
        let dir = tempdir().unwrap();
        let engine = engine(&dir);

        let result = engine.upload("notes.csv", b"a,b,c").await;
        assert!(matches!(result, Err(Error::UnsupportedFileType(_))));
        assert!(!dir.path().join("documents").join("notes.csv").exists());
        assert_eq!(engine.registry().len(), 0);
    }

    #[tokio::test]
    async fn test_upload_strips_directories() {
        let dir = tempdir().unwrap();
        let engine = engine(&dir);

        let response = engine.upload("../outside.txt", b"Inside after all.").await.unwrap();
        assert_eq!(response.filename, "outside.txt");
        assert!(dir.path().join("documents").join("outside.txt").exists());
        assert!(!dir.path().join("outside.txt").exists());
    }

    #[tokio::test]
    async fn test_failed_upload_is_removed() {
        let dir = tempdir().unwrap();
        let engine = engine(&dir);

        let result = engine.upload("blank.txt", b"   ").await;
        assert!(matches!(result, Err(Error::Ingestion { .. })));
        assert!(!dir.path().join("documents").join("blank.txt").exists());
    }

    #[tokio::test]
    async fn test_reupload_same_content_keeps_document() {
        let dir = tempdir().unwrap();
        let engine = engine(&dir);

        let first = engine.upload("cells.txt", b"Cells divide.").await.unwrap();
        let second = engine.upload("cells.txt", b"Cells divide.").await.unwrap();
        assert_eq!(first.document.document_id, second.document.document_id);

        let third = engine.upload("cells.txt", b"Cells divide by mitosis.").await.unwrap();
        assert_ne!(first.document.document_id, third.document.document_id);
        assert_eq!(engine.registry().len(), 1);
    }
}
