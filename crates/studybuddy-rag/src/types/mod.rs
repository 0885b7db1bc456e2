//! Core types for the StudyBuddy engine

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, DocumentRecord, DEFAULT_SUBJECT};
pub use query::ChatRequest;
pub use response::{AnswerResult, HealthResponse, SourceDocument, UploadResponse};
