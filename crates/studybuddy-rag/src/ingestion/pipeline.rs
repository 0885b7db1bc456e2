//! Ingestion pipeline: load, split, tag, index, register

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::providers::VectorIndex;
use crate::registry::DocumentRegistry;
use crate::types::{Chunk, DocumentRecord, DEFAULT_SUBJECT};

use super::loader::{LoadedText, LoaderRegistry};
use super::splitter::RecursiveTextSplitter;

/// Outcome of a directory scan
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Newly ingested documents
    pub ingested: Vec<DocumentRecord>,
    /// Files skipped because their path was already registered
    pub skipped: Vec<PathBuf>,
    /// Files that failed, with the reason
    pub failed: Vec<(PathBuf, String)>,
}

/// Turns files into indexed chunks and registry entries
pub struct IngestPipeline {
    loaders: LoaderRegistry,
    splitter: RecursiveTextSplitter,
    index: Arc<dyn VectorIndex>,
    registry: Arc<DocumentRegistry>,
}

impl IngestPipeline {
    /// Create a pipeline from explicit parts
    pub fn new(
        loaders: LoaderRegistry,
        splitter: RecursiveTextSplitter,
        index: Arc<dyn VectorIndex>,
        registry: Arc<DocumentRegistry>,
    ) -> Self {
        Self {
            loaders,
            splitter,
            index,
            registry,
        }
    }

    /// Create a pipeline with the built-in loaders for the configured extensions
    pub fn from_config(
        config: &RagConfig,
        index: Arc<dyn VectorIndex>,
        registry: Arc<DocumentRegistry>,
    ) -> Self {
        Self::new(
            LoaderRegistry::with_defaults(&config.documents.supported_extensions),
            RecursiveTextSplitter::from_config(&config.chunking),
            index,
            registry,
        )
    }

    /// Whether a loader exists for the file's extension
    pub fn supports(&self, path: &Path) -> bool {
        self.loaders.supports(path)
    }

    /// Ingest one file under the default subject
    pub async fn ingest(&self, path: &Path) -> Result<DocumentRecord> {
        self.ingest_with_subject(path, DEFAULT_SUBJECT).await
    }

    /// Ingest one file and register it under its canonical path
    ///
    /// If the path is already registered with identical content, the existing
    /// record is returned untouched. If the content changed, the file is
    /// indexed under a new document ID, registered, and only then are the old
    /// vectors removed, so a failed re-index leaves the previous version
    /// searchable.
    pub async fn ingest_with_subject(&self, path: &Path, subject: &str) -> Result<DocumentRecord> {
        let filename = file_name(path);

        if !self.loaders.supports(path) {
            return Err(Error::UnsupportedFileType(filename));
        }

        let canonical = tokio::fs::canonicalize(path)
            .await
            .map_err(|e| Error::ingestion(&filename, e.to_string()))?;
        let size_bytes = tokio::fs::metadata(&canonical)
            .await
            .map_err(|e| Error::ingestion(&filename, e.to_string()))?
            .len();

        let loaders = self.loaders.clone();
        let load_path = canonical.clone();
        let loaded = tokio::task::spawn_blocking(move || loaders.load(&load_path))
            .await
            .map_err(|e| Error::internal(format!("Task join error: {}", e)))??;

        if loaded.is_blank() {
            return Err(Error::ingestion(&filename, "no text could be extracted"));
        }

        let content_hash = hash_content(&loaded.full_text());

        let previous = self.registry.get(&canonical);
        if let Some(existing) = &previous {
            if existing.content_hash == content_hash && existing.subject == subject {
                tracing::info!("{} is unchanged, keeping document {}", filename, existing.document_id);
                return Ok(existing.clone());
            }
        }

        let mut record = DocumentRecord::new(&filename, content_hash, size_bytes).with_subject(subject);
        record.page_count = loaded.page_count;

        let chunks = self.build_chunks(&record, &loaded);
        if chunks.is_empty() {
            return Err(Error::ingestion(&filename, "document produced no chunks"));
        }
        tracing::debug!("{}: {} chunks", filename, chunks.len());

        record.chunk_count = self.index.add_chunks(chunks).await?;
        self.registry.register(canonical, record.clone()).await;

        if let Some(old) = previous {
            match self.index.delete_by_document(&old.document_id).await {
                Ok(removed) => tracing::info!("{} changed, removed {} stale chunks", filename, removed),
                Err(e) => tracing::warn!(
                    "{} changed but stale chunks of document {} could not be removed: {}",
                    filename,
                    old.document_id,
                    e
                ),
            }
        }

        tracing::info!(
            "Ingested {} ({} chunks, document {})",
            filename,
            record.chunk_count,
            record.document_id
        );
        Ok(record)
    }

    /// Split every page and tag the pieces; indices run across pages
    fn build_chunks(&self, record: &DocumentRecord, loaded: &LoadedText) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for page in &loaded.pages {
            for text in self.splitter.split_text(&page.text) {
                chunks.push(Chunk::new(record, chunks.len(), text, page.page_number));
            }
        }
        chunks
    }

    /// Ingest every supported, not yet registered file directly inside `dir`
    ///
    /// Each file is ingested on its own; a failure is logged and recorded in
    /// the report without stopping the scan.
    pub async fn scan_directory(&self, dir: &Path) -> Result<ScanReport> {
        let mut report = ScanReport::default();

        if !dir.exists() {
            tokio::fs::create_dir_all(dir).await?;
            tracing::info!("Created documents directory {}", dir.display());
            return Ok(report);
        }

        let files: Vec<PathBuf> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| self.loaders.supports(path))
            .collect();

        tracing::info!("Found {} supported files in {}", files.len(), dir.display());

        for path in files {
            let known = match tokio::fs::canonicalize(&path).await {
                Ok(canonical) => self.registry.contains(&canonical),
                Err(_) => false,
            };
            if known {
                tracing::debug!("Skipping already ingested {}", path.display());
                report.skipped.push(path);
                continue;
            }

            match self.ingest(&path).await {
                Ok(record) => report.ingested.push(record),
                Err(e) => {
                    tracing::error!("Failed to ingest {}: {}", path.display(), e);
                    report.failed.push((path, e.to_string()));
                }
            }
        }

        tracing::info!(
            "Scan of {} finished: {} ingested, {} skipped, {} failed",
            dir.display(),
            report.ingested.len(),
            report.skipped.len(),
            report.failed.len()
        );
        Ok(report)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// SHA-256 of the extracted text, hex encoded
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
