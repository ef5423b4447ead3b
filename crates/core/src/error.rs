use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Upstream throttled the request. Callers may retry after backing off.
    #[error("embedding provider rate limited the request: {details}")]
    RateLimited {
        retry_after: Option<Duration>,
        details: String,
    },

    #[error("embedding transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("embedding provider returned {status}: {details}")]
    Response { status: u16, details: String },

    #[error("malformed embedding response: {0}")]
    Malformed(String),

    #[error("embedding provider returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },

    #[error("invalid embedding config: {0}")]
    InvalidConfig(String),
}

impl EmbeddingError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, EmbeddingError::RateLimited { .. })
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            EmbeddingError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("collection {collection} expects {expected}-dimensional vectors, got {actual}")]
    DimensionMismatch {
        collection: String,
        expected: usize,
        actual: usize,
    },

    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl IngestError {
    /// Only throttled embedding calls are safe to retry: nothing has been written at that point.
    pub fn is_retryable(&self) -> bool {
        matches!(self, IngestError::Embedding(error) if error.is_retryable())
    }
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Index(#[from] IndexError),
}

impl RetrievalError {
    pub fn is_missing_collection(&self) -> bool {
        matches!(self, RetrievalError::Index(IndexError::CollectionNotFound(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_rate_limits_are_retryable() {
        let throttled = IngestError::from(EmbeddingError::RateLimited {
            retry_after: Some(Duration::from_secs(3)),
            details: "slow down".to_string(),
        });
        assert!(throttled.is_retryable());

        let rejected = IngestError::from(EmbeddingError::Response {
            status: 401,
            details: "bad key".to_string(),
        });
        assert!(!rejected.is_retryable());

        let mismatch = IngestError::from(IndexError::DimensionMismatch {
            collection: "docs".to_string(),
            expected: 3,
            actual: 4,
        });
        assert!(!mismatch.is_retryable());
    }

    #[test]
    fn missing_collection_is_recognised() {
        let error = RetrievalError::from(IndexError::CollectionNotFound("docs".to_string()));
        assert!(error.is_missing_collection());
        assert_eq!(error.to_string(), "collection not found: docs");
    }
}
