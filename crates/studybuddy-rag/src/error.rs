//! Error types for the StudyBuddy engine

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Engine errors
#[derive(Debug, Error)]
pub enum Error {
    /// Missing credentials or invalid settings (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Extension outside the supported set
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Unreadable, corrupt or empty document
    #[error("Failed to ingest '{filename}': {message}")]
    Ingestion { filename: String, message: String },

    /// Request does not satisfy the operation contract
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Vector index failure while answering a question
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    /// Generative model failure while answering a question
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Embedding provider error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector index storage error
    #[error("Vector index error: {0}")]
    VectorDb(String),

    /// Provider call exceeded its time budget
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Provider asked us to slow down
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Provider quota exhausted
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Provider rejected the credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Provider returned a server-side failure
    #[error("Upstream error (HTTP {status}): {message}")]
    Upstream { status: u16, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an ingestion error
    pub fn ingestion(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Ingestion {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector index error
    pub fn vector_db(message: impl Into<String>) -> Self {
        Self::VectorDb(message.into())
    }

    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether a provider call that failed with this error may be retried.
    ///
    /// Quota, authentication, configuration and malformed-request errors are
    /// permanent; timeouts, throttling, transport failures and 5xx responses
    /// are transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Timeout(_) | Error::RateLimited(_) | Error::Upstream { .. } => true,
            Error::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            _ => false,
        }
    }

    /// Classify a non-success HTTP status returned by a provider
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => Error::Unauthorized(body.to_string()),
            429 if body.contains("insufficient_quota") => Error::QuotaExceeded(body.to_string()),
            408 => Error::Timeout(body.to_string()),
            429 => Error::RateLimited(body.to_string()),
            500..=599 => Error::Upstream {
                status,
                message: body.to_string(),
            },
            _ => Error::Internal(format!("HTTP {}: {}", status, body)),
        }
    }

    fn kind(&self) -> (StatusCode, &'static str) {
        match self {
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            Error::UnsupportedFileType(_) => (StatusCode::BAD_REQUEST, "unsupported_type"),
            Error::Ingestion { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "ingestion_error"),
            Error::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            Error::Retrieval(_) => (StatusCode::SERVICE_UNAVAILABLE, "retrieval_error"),
            Error::Generation(_) => (StatusCode::SERVICE_UNAVAILABLE, "generation_error"),
            Error::Embedding(_) => (StatusCode::SERVICE_UNAVAILABLE, "embedding_error"),
            Error::VectorDb(_) => (StatusCode::INTERNAL_SERVER_ERROR, "vector_db_error"),
            Error::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
            Error::RateLimited(_) | Error::QuotaExceeded(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "quota_error")
            }
            Error::Unauthorized(_) => (StatusCode::BAD_GATEWAY, "provider_auth_error"),
            Error::Upstream { .. } => (StatusCode::BAD_GATEWAY, "upstream_error"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "json_error"),
            Error::Http(_) => (StatusCode::BAD_GATEWAY, "http_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = self.kind();

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(Error::from_status(401, "bad key"), Error::Unauthorized(_)));
        assert!(matches!(
            Error::from_status(429, r#"{"error":{"code":"insufficient_quota"}}"#),
            Error::QuotaExceeded(_)
        ));
        assert!(matches!(Error::from_status(429, "slow down"), Error::RateLimited(_)));
        assert!(matches!(Error::from_status(503, "busy"), Error::Upstream { status: 503, .. }));
        assert!(matches!(Error::from_status(400, "bad"), Error::Internal(_)));
    }

    #[test]
    fn test_retryable() {
        assert!(Error::from_status(502, "").is_retryable());
        assert!(Error::from_status(429, "slow down").is_retryable());
        assert!(Error::Timeout("30s".into()).is_retryable());

        assert!(!Error::from_status(401, "").is_retryable());
        assert!(!Error::from_status(429, "insufficient_quota").is_retryable());
        assert!(!Error::Config("missing key".into()).is_retryable());
        assert!(!Error::generation("bad prompt").is_retryable());
    }

    #[test]
    fn test_response_status() {
        let response = Error::UnsupportedFileType("csv".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = Error::Generation("down".into()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = Error::Retrieval("down".into()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
