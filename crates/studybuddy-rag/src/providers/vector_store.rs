//! Vector index trait for storing and searching chunks

use async_trait::async_trait;
use uuid::Uuid;
use crate::error::Result;
use crate::types::Chunk;

/// Search result from the vector index
#[derive(Debug, Clone)]
pub struct VectorSearchResult {
    /// The matched chunk
    pub chunk: Chunk,
    /// Similarity score (higher is more similar)
    pub similarity: f32,
}

/// Trait for chunk storage and similarity search
///
/// Embedding the chunks is the index's responsibility, so callers hand over
/// plain text and query with plain text.
///
/// Implementations:
/// - `LocalVectorIndex`: brute-force cosine index persisted as JSON
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Embed and store a batch of chunks, returning how many were stored
    async fn add_chunks(&self, chunks: Vec<Chunk>) -> Result<usize>;

    /// Return the `top_k` chunks most similar to `query`, best first
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<VectorSearchResult>>;

    /// Delete all chunks for a document
    async fn delete_by_document(&self, document_id: &Uuid) -> Result<usize>;

    /// Get total number of chunks stored
    async fn len(&self) -> Result<usize>;

    /// Check if the index is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Get provider name for logging
    fn name(&self) -> &str;
}
