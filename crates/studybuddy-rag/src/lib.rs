//! studybuddy-rag: retrieval-augmented study assistant
//!
//! Ingests PDF, text and markdown study materials into a persisted vector
//! index, answers questions grounded in the retrieved passages with their
//! sources, and adds short study tips. Generation and embeddings come from an
//! OpenAI-compatible API or a local Ollama server.

pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod registry;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use engine::StudyBuddyEngine;
pub use error::{Error, Result};
pub use providers::{EmbeddingProvider, LlmProvider, Providers, VectorIndex};
pub use registry::DocumentRegistry;
pub use types::{AnswerResult, ChatRequest, Chunk, DocumentRecord, SourceDocument};
