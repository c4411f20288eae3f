//! OpenAI-compatible chat completions client.
//!
//! Used for both OpenAI itself and the Hugging Face inference router, which
//! speaks the same protocol under a different base URL and key.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ChatMessage, LlmClient, LlmError};

/// OpenAI-compatible API client. No retries: a failure is reported as-is.
pub struct OpenAiClient {
    client: Client,
    /// Backend name used in error messages
    label: &'static str,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f64,
}

impl OpenAiClient {
    pub fn new(
        client: Client,
        label: &'static str,
        base_url: &str,
        api_key: String,
        model: String,
        temperature: f64,
    ) -> Self {
        Self {
            client,
            label,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            model,
            temperature,
        }
    }

    /// Create an LlmError from an HTTP failure.
    fn create_error(&self, status: reqwest::StatusCode, body: &str) -> LlmError {
        LlmError::http_status(
            status.as_u16(),
            format!("Error calling {}: {}", self.label, body),
        )
    }

    /// Pull the reply text out of a raw response body.
    ///
    /// Non-string content is rendered as text rather than rejected.
    fn parse_body(&self, body: &str) -> Result<String, LlmError> {
        let parsed: OpenAiResponse = serde_json::from_str(body).map_err(|e| {
            LlmError::unexpected_payload(format!(
                "Failed to parse {} response: {}, body: {}",
                self.label, e, body
            ))
        })?;

        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            LlmError::unexpected_payload(format!("No choices in {} response", self.label))
        })?;

        Ok(match choice.message.content {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat_completion(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let request = OpenAiRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };

        tracing::debug!("Sending request to {}: model={}", self.label, self.model);

        let response = match self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                if e.is_timeout() {
                    return Err(LlmError::network(format!(
                        "Error calling {}: request timeout: {}",
                        self.label, e
                    )));
                } else if e.is_connect() {
                    return Err(LlmError::network(format!(
                        "Error calling {}: connection failed: {}",
                        self.label, e
                    )));
                } else {
                    return Err(LlmError::network(format!(
                        "Error calling {}: {}",
                        self.label, e
                    )));
                }
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(self.create_error(status, &body));
        }

        self.parse_body(&body)
    }
}

/// Chat completions request format.
#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
}

/// Chat completions response format.
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

/// A choice in the response.
#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

/// Message in the response.
#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: serde_json::Value,
}
