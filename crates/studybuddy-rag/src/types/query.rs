//! Chat request types

use serde::{Deserialize, Serialize};

use crate::config::MAX_SOURCES_LIMIT;
use crate::error::{Error, Result};

/// Maximum question length in characters
pub const MAX_QUESTION_CHARS: usize = 1000;

/// Chat request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The question to answer (1-1000 characters)
    pub question: String,

    /// Include retrieved sources in the response (default: true)
    #[serde(default = "default_include_sources")]
    pub include_sources: bool,

    /// Number of sources to retrieve (1-10); the configured default when absent
    #[serde(default)]
    pub max_sources: Option<usize>,
}

fn default_include_sources() -> bool {
    true
}

impl ChatRequest {
    /// Create a request with default options
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            include_sources: true,
            max_sources: None,
        }
    }

    /// Check the request against the chat contract
    pub fn validate(&self) -> Result<()> {
        let len = self.question.chars().count();
        if len == 0 {
            return Err(Error::Validation("question must not be empty".to_string()));
        }
        if len > MAX_QUESTION_CHARS {
            return Err(Error::Validation(format!(
                "question must be at most {} characters (got {})",
                MAX_QUESTION_CHARS, len
            )));
        }
        if let Some(k) = self.max_sources {
            if !(1..=MAX_SOURCES_LIMIT).contains(&k) {
                return Err(Error::Validation(format!(
                    "max_sources must be between 1 and {}",
                    MAX_SOURCES_LIMIT
                )));
            }
        }
        Ok(())
    }
}
