//! Ollama chat API client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ChatMessage, LlmClient, LlmError};

/// Client for a local Ollama server (`/api/chat`, non-streaming).
pub struct OllamaClient {
    client: Client,
    url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(client: Client, url: String, model: String) -> Self {
        Self { client, url, model }
    }

    /// Pull the reply text out of a raw response body.
    fn parse_body(body: &str) -> Result<String, LlmError> {
        let parsed: OllamaResponse = serde_json::from_str(body).map_err(|e| {
            LlmError::unexpected_payload(format!("Failed to parse Ollama response: {}", e))
        })?;

        match parsed.message.and_then(|m| m.content) {
            Some(serde_json::Value::String(content)) => Ok(content),
            _ => Err(LlmError::unexpected_payload(
                "Ollama returned an unexpected response format.",
            )),
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn chat_completion(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let request = OllamaRequest {
            model: &self.model,
            messages,
            stream: false,
        };

        tracing::debug!("Sending request to Ollama: model={}", self.model);

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::network(format!("Error calling Ollama: request timeout: {}", e))
                } else {
                    LlmError::network(format!("Error calling Ollama: {}", e))
                }
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(LlmError::http_status(
                status.as_u16(),
                format!("Error calling Ollama: {}", body),
            ));
        }

        Self::parse_body(&body)
    }
}

/// Ollama chat request format.
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

/// Ollama chat response format (only the fields we read).
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    message: Option<OllamaMessage>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    /// Kept loose so a non-string reply is reported, not a parse error
    #[serde(default)]
    content: Option<serde_json::Value>,
}
