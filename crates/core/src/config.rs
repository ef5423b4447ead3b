use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// Connection settings for an OpenAI-compatible embeddings endpoint.
///
/// When `api_version` is set the endpoint is treated as an Azure OpenAI resource: the model name is
/// used as the deployment and the key travels in the `api-key` header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub api_version: Option<String>,
    pub timeout: Option<Duration>,
}

impl EmbeddingConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            api_version: None,
            timeout: None,
        }
    }

    pub fn is_azure(&self) -> bool {
        self.api_version.is_some()
    }

    pub fn embeddings_url(&self) -> String {
        let base = self.endpoint.trim_end_matches('/');
        match &self.api_version {
            Some(version) => format!(
                "{base}/openai/deployments/{}/embeddings?api-version={version}",
                self.model
            ),
            None => format!("{base}/embeddings"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QdrantConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
}

impl QdrantConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{EmbeddingConfig, QdrantConfig};

    #[test]
    fn openai_url_appends_embeddings_path() {
        let config = EmbeddingConfig::new("https://api.openai.com/v1/", "key");
        assert!(!config.is_azure());
        assert_eq!(config.embeddings_url(), "https://api.openai.com/v1/embeddings");
    }

    #[test]
    fn azure_url_uses_deployment_and_version() {
        let mut config = EmbeddingConfig::new("https://example.openai.azure.com", "key");
        config.api_version = Some("2024-02-01".to_string());
        assert_eq!(
            config.embeddings_url(),
            "https://example.openai.azure.com/openai/deployments/text-embedding-ada-002/embeddings?api-version=2024-02-01"
        );
    }

    #[test]
    fn blank_qdrant_key_is_dropped() {
        let config = QdrantConfig::new("http://localhost:6333").with_api_key(Some("  ".to_string()));
        assert!(config.api_key.is_none());
    }
}
