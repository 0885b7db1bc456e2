//! Local vector index persisted to disk
//!
//! Chunks are embedded through the configured [`EmbeddingProvider`] and kept
//! in memory next to their vectors. Search is an exact cosine scan. Every
//! mutation rewrites `index.json` so the index survives restarts.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::Chunk;

use super::embedding::EmbeddingProvider;
use super::vector_store::{VectorIndex, VectorSearchResult};

/// A stored chunk with its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexedChunk {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// On-disk layout of the index
#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexFile {
    /// Embedding model that produced the vectors
    #[serde(default)]
    embedder: String,
    entries: Vec<IndexedChunk>,
}

/// Brute-force cosine index over embedded chunks
pub struct LocalVectorIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    entries: RwLock<Vec<IndexedChunk>>,
    path: Option<PathBuf>,
    /// Held across snapshot, write and swap of every mutation
    write_lock: Mutex<()>,
}

impl LocalVectorIndex {
    /// Create an empty in-memory index
    pub fn in_memory(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Vec::new()),
            path: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Open the index stored at `path`, starting empty if the file is absent
    pub fn open(path: impl Into<PathBuf>, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let file: IndexFile = serde_json::from_str(&content).map_err(|e| {
                Error::vector_db(format!("Corrupt index at {}: {}", path.display(), e))
            })?;
            if !file.embedder.is_empty() && file.embedder != embedder.name() {
                tracing::warn!(
                    "Index at {} was built with '{}' but the active embedder is '{}'",
                    path.display(),
                    file.embedder,
                    embedder.name()
                );
            }
            tracing::info!("Loaded {} indexed chunks from {}", file.entries.len(), path.display());
            file.entries
        } else {
            Vec::new()
        };

        Ok(Self {
            embedder,
            entries: RwLock::new(entries),
            path: Some(path),
            write_lock: Mutex::new(()),
        })
    }

    /// Persist `next` and only then make it the live entry set
    ///
    /// Callers hold `write_lock`. When the write fails the in-memory entries
    /// are left as they were.
    async fn commit(&self, next: Vec<IndexedChunk>) -> Result<()> {
        let next = match self.path.clone() {
            None => next,
            Some(path) => {
                let file = IndexFile {
                    embedder: self.embedder.name().to_string(),
                    entries: next,
                };
                tokio::task::spawn_blocking(move || write_atomic(&path, &file).map(|()| file.entries))
                    .await
                    .map_err(|e| Error::internal(format!("Task join error: {}", e)))??
            }
        };

        *self.entries.write() = next;
        Ok(())
    }
}

fn write_atomic(path: &Path, file: &IndexFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, serde_json::to_vec(file)?)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Cosine similarity; zero for mismatched or degenerate vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a < f32::EPSILON || mag_b < f32::EPSILON {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

#[async_trait]
impl VectorIndex for LocalVectorIndex {
    async fn add_chunks(&self, chunks: Vec<Chunk>) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let count = chunks.len();
        let _guard = self.write_lock.lock().await;
        let mut next = self.entries.read().clone();
        next.extend(
            chunks
                .into_iter()
                .zip(embeddings)
                .map(|(chunk, embedding)| IndexedChunk { chunk, embedding }),
        );

        self.commit(next).await?;
        Ok(count)
    }

    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<VectorSearchResult>> {
        if top_k == 0 || self.entries.read().is_empty() {
            return Ok(Vec::new());
        }

        let query_vec = self.embedder.embed(query).await?;

        let entries = self.entries.read();
        let mut results: Vec<VectorSearchResult> = entries
            .iter()
            .map(|entry| VectorSearchResult {
                chunk: entry.chunk.clone(),
                similarity: cosine_similarity(&query_vec, &entry.embedding),
            })
            .collect();
        drop(entries);

        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(top_k);
        Ok(results)
    }

    async fn delete_by_document(&self, document_id: &Uuid) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let mut next = self.entries.read().clone();
        let before = next.len();
        next.retain(|e| e.chunk.document_id != *document_id);
        let removed = before - next.len();

        if removed > 0 {
            self.commit(next).await?;
        }
        Ok(removed)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.read().len())
    }

    fn name(&self) -> &str {
        "local-cosine"
    }
}
