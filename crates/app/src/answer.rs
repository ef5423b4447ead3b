use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

const TEMPERATURE: f32 = 0.2;

/// Chat-completion settings. `api_version` switches to Azure OpenAI deployment URLs.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub api_version: Option<String>,
}

impl ChatConfig {
    fn completions_url(&self) -> String {
        let base = self.endpoint.trim_end_matches('/');
        match &self.api_version {
            Some(version) => format!(
                "{base}/openai/deployments/{}/chat/completions?api-version={version}",
                self.model
            ),
            None => format!("{base}/chat/completions"),
        }
    }
}

/// Turns a grounded prompt into an answer.
pub struct AnswerGenerator {
    client: Client,
    url: String,
    model: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

impl AnswerGenerator {
    pub fn new(config: &ChatConfig) -> Result<Self> {
        anyhow::ensure!(!config.api_key.trim().is_empty(), "missing chat API key");
        anyhow::ensure!(!config.model.trim().is_empty(), "missing chat model name");

        let mut headers = HeaderMap::new();
        let key = config.api_key.trim();
        if config.api_version.is_some() {
            headers.insert("api-key", HeaderValue::from_str(key).context("invalid chat API key")?);
        } else {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {key}")).context("invalid chat API key")?,
            );
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .context("failed to build chat HTTP client")?;

        Ok(Self {
            client,
            url: config.completions_url(),
            model: config.api_version.is_none().then(|| config.model.clone()),
        })
    }

    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.as_deref(),
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .context("chat completion request failed")?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .context("failed to parse chat completion response")?;
        anyhow::ensure!(status.is_success(), "chat completion failed ({status}): {body}");

        parse_chat_response(&body)
    }
}

fn parse_chat_response(body: &Value) -> Result<String> {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| anyhow::anyhow!("chat completion has no message content: {body}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_choice_content_is_the_answer() {
        let body = json!({
            "choices": [
                {"message": {"role": "assistant", "content": "  New Delhi.\n"}},
                {"message": {"role": "assistant", "content": "ignored"}}
            ]
        });
        assert_eq!(parse_chat_response(&body).expect("parses"), "New Delhi.");
    }

    #[test]
    fn missing_content_is_an_error() {
        assert!(parse_chat_response(&json!({"choices": []})).is_err());
    }

    #[test]
    fn azure_deployment_url() {
        let config = ChatConfig {
            endpoint: "https://example.openai.azure.com/".to_string(),
            api_key: "key".to_string(),
            model: "gpt-4o".to_string(),
            api_version: Some("2024-02-01".to_string()),
        };
        assert_eq!(
            config.completions_url(),
            "https://example.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-02-01"
        );
    }
}
