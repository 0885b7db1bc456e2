//! Document and chunk types with source tracking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subject tag applied when none is given
pub const DEFAULT_SUBJECT: &str = "general";

/// A document that has been ingested
///
/// Created once per ingested file. Re-ingesting the same path replaces the
/// whole record rather than mutating it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentRecord {
    /// Unique document ID
    pub document_id: Uuid,
    /// File name (final path component)
    pub filename: String,
    /// Subject tag
    pub subject: String,
    /// Number of chunks pushed to the vector index
    pub chunk_count: usize,
    /// SHA-256 of the extracted text
    pub content_hash: String,
    /// File size in bytes
    pub size_bytes: u64,
    /// Number of pages for page-oriented formats
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    /// Ingestion timestamp
    pub ingested_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// Create a new record with a fresh document ID
    pub fn new(filename: impl Into<String>, content_hash: String, size_bytes: u64) -> Self {
        Self {
            document_id: Uuid::new_v4(),
            filename: filename.into(),
            subject: DEFAULT_SUBJECT.to_string(),
            chunk_count: 0,
            content_hash,
            size_bytes,
            page_count: None,
            ingested_at: Utc::now(),
        }
    }

    /// Tag the record with a subject; blank input keeps the default
    pub fn with_subject(mut self, subject: &str) -> Self {
        let subject = subject.trim();
        if !subject.is_empty() {
            self.subject = subject.to_string();
        }
        self
    }
}

/// A bounded slice of a document's text, the unit of indexing and retrieval
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Chunk text
    pub text: String,
    /// Owning document
    pub document_id: Uuid,
    /// Position within the document (0-based, contiguous)
    pub chunk_index: usize,
    /// File name of the owning document
    pub filename: String,
    /// Subject tag of the owning document
    pub subject: String,
    /// Page the chunk came from (1-based), for page-oriented formats
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
}

impl Chunk {
    /// Tag a piece of text with its document metadata
    pub fn new(record: &DocumentRecord, chunk_index: usize, text: String, page_number: Option<u32>) -> Self {
        Self {
            text,
            document_id: record.document_id,
            chunk_index,
            filename: record.filename.clone(),
            subject: record.subject.clone(),
            page_number,
        }
    }

    /// Number of characters in the chunk
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}
