//! Embeddings over OpenAI-compatible and Azure OpenAI HTTP endpoints.

use crate::config::EmbeddingConfig;
use crate::embeddings::EmbeddingProvider;
use crate::error::EmbeddingError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Async embeddings client. Performs exactly one request per batch and never retries on its own.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    send_model: bool,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        if config.api_key.trim().is_empty() {
            return Err(EmbeddingError::InvalidConfig("missing embedding API key".to_string()));
        }
        if config.model.trim().is_empty() {
            return Err(EmbeddingError::InvalidConfig("missing embedding model name".to_string()));
        }
        let endpoint = config.embeddings_url();
        url::Url::parse(&endpoint)
            .map_err(|error| EmbeddingError::InvalidConfig(format!("{endpoint}: {error}")))?;

        let mut headers = HeaderMap::new();
        let key = config.api_key.trim();
        if config.is_azure() {
            headers.insert(
                "api-key",
                HeaderValue::from_str(key)
                    .map_err(|_| EmbeddingError::InvalidConfig("invalid embedding API key".to_string()))?,
            );
        } else {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {key}"))
                    .map_err(|_| EmbeddingError::InvalidConfig("invalid embedding API key".to_string()))?,
            );
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint,
            model: config.model.clone(),
            send_model: !config.is_azure(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: self.send_model.then_some(self.model.as_str()),
            input: texts,
        };
        let response = self.client.post(&self.endpoint).json(&request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(classify_failure(status, retry_after, body));
        }

        let body = response.text().await?;
        let vectors = parse_embedding_response(&body, texts.len())?;
        debug!(count = vectors.len(), model = %self.model, "embedded batch");
        Ok(vectors)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn classify_failure(status: StatusCode, retry_after: Option<Duration>, body: String) -> EmbeddingError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        EmbeddingError::RateLimited {
            retry_after,
            details: body,
        }
    } else {
        EmbeddingError::Response {
            status: status.as_u16(),
            details: body,
        }
    }
}

fn parse_embedding_response(body: &str, expected: usize) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let mut parsed: EmbeddingResponse =
        serde_json::from_str(body).map_err(|error| EmbeddingError::Malformed(error.to_string()))?;

    if parsed.data.len() != expected {
        return Err(EmbeddingError::CountMismatch {
            expected,
            actual: parsed.data.len(),
        });
    }

    parsed.data.sort_by_key(|entry| entry.index);
    let in_order = parsed
        .data
        .iter()
        .enumerate()
        .all(|(position, entry)| entry.index == position);
    if !in_order {
        return Err(EmbeddingError::Malformed(
            "embedding indices do not cover the request".to_string(),
        ));
    }

    let vectors: Vec<Vec<f32>> = parsed.data.into_iter().map(|entry| entry.embedding).collect();
    if let Some(first) = vectors.first() {
        if vectors.iter().any(|vector| vector.len() != first.len()) {
            return Err(EmbeddingError::Malformed(
                "embedding vectors have inconsistent dimensions".to_string(),
            ));
        }
    }

    Ok(vectors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_is_reordered_by_index() {
        let body = r#"{"data":[
            {"embedding":[0.0,1.0],"index":1},
            {"embedding":[1.0,0.0],"index":0}
        ]}"#;

        let vectors = parse_embedding_response(body, 2).expect("response parses");
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn count_mismatch_is_reported() {
        let body = r#"{"data":[{"embedding":[0.5],"index":0}]}"#;
        let error = parse_embedding_response(body, 2).expect_err("short response must fail");
        assert!(matches!(
            error,
            EmbeddingError::CountMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn ragged_vectors_are_malformed() {
        let body = r#"{"data":[
            {"embedding":[0.5,0.5],"index":0},
            {"embedding":[0.5],"index":1}
        ]}"#;
        assert!(matches!(
            parse_embedding_response(body, 2),
            Err(EmbeddingError::Malformed(_))
        ));
    }

    #[test]
    fn throttling_maps_to_retryable_rate_limit() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));

        let error = classify_failure(
            StatusCode::TOO_MANY_REQUESTS,
            parse_retry_after(&headers),
            "quota".to_string(),
        );

        assert!(error.is_retryable());
        assert_eq!(error.retry_after(), Some(Duration::from_secs(7)));
    }

    #[test]
    fn other_failures_are_not_retryable() {
        let error = classify_failure(StatusCode::UNAUTHORIZED, None, "bad key".to_string());
        assert!(!error.is_retryable());
        assert!(matches!(error, EmbeddingError::Response { status: 401, .. }));
    }

    #[test]
    fn missing_key_is_rejected_before_any_request() {
        let config = EmbeddingConfig::new("https://api.openai.com/v1", " ");
        assert!(matches!(
            OpenAiEmbedder::new(&config),
            Err(EmbeddingError::InvalidConfig(_))
        ));
    }
}
