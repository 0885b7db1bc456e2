//! Response types for chat, upload and health

use serde::{Deserialize, Serialize};

use super::document::DocumentRecord;
use crate::providers::vector_store::VectorSearchResult;

/// Characters of chunk text kept in a source snippet
pub const SNIPPET_CHARS: usize = 200;

/// Marker appended to every snippet
pub const SNIPPET_ELLIPSIS: &str = "...";

/// Source reference attached to an answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceDocument {
    /// Source filename
    pub filename: String,
    /// Prefix of the chunk text
    pub content_snippet: String,
    /// Similarity score reported by the vector index
    pub relevance_score: f32,
    /// Page number (if applicable)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
}

impl SourceDocument {
    /// Create a source reference from a retrieved chunk
    pub fn from_search_result(result: &VectorSearchResult) -> Self {
        Self {
            filename: result.chunk.filename.clone(),
            content_snippet: snippet(&result.chunk.text),
            relevance_score: result.similarity,
            page_number: result.chunk.page_number,
        }
    }
}

/// First [`SNIPPET_CHARS`] characters of `text` followed by [`SNIPPET_ELLIPSIS`]
pub fn snippet(text: &str) -> String {
    let mut out: String = text.chars().take(SNIPPET_CHARS).collect();
    out.push_str(SNIPPET_ELLIPSIS);
    out
}

/// Result of answering one question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    /// Generated explanation
    pub answer: String,
    /// Retrieved sources, in retrieval order
    pub sources: Vec<SourceDocument>,
    /// Up to three study tips
    pub study_tips: Vec<String>,
    /// Wall-clock seconds spent answering
    pub response_time: f64,
}

impl AnswerResult {
    /// Drop the sources when the caller opted out
    pub fn without_sources(mut self) -> Self {
        self.sources.clear();
        self
    }
}

/// Response to a successful upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Human-readable acknowledgement
    pub message: String,
    /// Stored file name
    pub filename: String,
    /// Registry entry for the ingested file
    pub document: DocumentRecord,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Number of ingested documents
    pub documents_count: usize,
    /// Ingested documents in registration order
    pub documents: Vec<DocumentRecord>,
    /// Crate version
    pub version: String,
    /// Seconds since the engine started
    pub uptime: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;

    fn result(text: &str, similarity: f32) -> VectorSearchResult {
        let record = DocumentRecord::new("cells.md", String::new(), 0);
        VectorSearchResult {
            chunk: Chunk::new(&record, 0, text.to_string(), None),
            similarity,
        }
    }

    #[test]
    fn test_snippet_truncates_long_text() {
        let text = "a".repeat(450);
        let s = snippet(&text);
        assert_eq!(s.chars().count(), 203);
        assert!(s.ends_with("..."));
        assert!(s.starts_with(&"a".repeat(200)));
    }

    #[test]
    fn test_snippet_at_exact_limit() {
        let text = "b".repeat(200);
        let s = snippet(&text);
        assert_eq!(s, format!("{}...", text));
        assert_eq!(s.chars().count(), 203);

        let s = snippet(&"b".repeat(201));
        assert_eq!(s, format!("{}...", "b".repeat(200)));
    }

    #[test]
    fn test_snippet_short_text_still_marked() {
        assert_eq!(snippet("Short chunk"), "Short chunk...");
    }

    #[test]
    fn test_snippet_counts_characters_not_bytes() {
        let text = "é".repeat(300);
        let s = snippet(&text);
        assert_eq!(s.chars().count(), 203);
    }

    #[test]
    fn test_source_uses_real_score() {
        let source = SourceDocument::from_search_result(&result("Photosynthesis", 0.42));
        assert_eq!(source.filename, "cells.md");
        assert_eq!(source.relevance_score, 0.42);
        assert_eq!(source.content_snippet, "Photosynthesis...");
    }

    #[test]
    fn test_without_sources() {
        let answer = AnswerResult {
            answer: "42".to_string(),
            sources: vec![SourceDocument::from_search_result(&result("x", 0.9))],
            study_tips: vec![],
            response_time: 0.1,
        };
        assert!(answer.without_sources().sources.is_empty());
    }
}
