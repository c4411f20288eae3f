//! LLM gateway for talking to language models.
//!
//! This module provides a trait-based abstraction over the four supported
//! backends. Each backend implements [`LlmClient`]; [`ProviderGateway`]
//! routes a call to the right one by [`Provider`], checks credentials and
//! enforces the call ceiling for metered providers.
//!
//! The agent core only sees [`LlmGateway`]: role-tagged messages in, raw
//! text out.

mod error;
mod mock;
mod ollama;
mod openai;
mod quota;

pub use error::{LlmError, LlmErrorKind};
pub use mock::MockClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
pub use quota::CallQuota;

use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;

/// Role in a chat conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        ChatMessage {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

/// Backend that answers prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Canned replies, no network
    #[default]
    Mock,
    /// Local Ollama server
    Ollama,
    /// OpenAI chat completions
    #[serde(rename = "openai")]
    OpenAi,
    /// Hugging Face inference router (OpenAI-compatible)
    #[serde(alias = "huggingface")]
    Hf,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Mock => "mock",
            Provider::Ollama => "ollama",
            Provider::OpenAi => "openai",
            Provider::Hf => "hf",
        }
    }

    /// Whether calls count against the [`CallQuota`].
    pub fn is_metered(&self) -> bool {
        matches!(self, Provider::OpenAi | Provider::Hf)
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mock" => Ok(Provider::Mock),
            "ollama" => Ok(Provider::Ollama),
            "openai" => Ok(Provider::OpenAi),
            "hf" | "huggingface" => Ok(Provider::Hf),
            other => Err(format!("unknown provider '{}'", other)),
        }
    }
}

/// One concrete chat backend.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send the conversation and return the reply text.
    async fn chat_completion(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;
}

/// What the agent core calls: route messages to a provider, get raw text.
///
/// # Errors
/// - `Configuration` when a non-mock provider lacks its credential
/// - `Transport` when the backend fails or replies without text
/// - `QuotaExceeded` when the metered call ceiling is reached
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn send(&self, messages: &[ChatMessage], provider: Provider) -> Result<String, LlmError>;

    /// Call ceiling for metered providers, if this gateway enforces one.
    fn quota(&self) -> Option<&CallQuota> {
        None
    }
}

/// Gateway over the real backends.
pub struct ProviderGateway {
    mock: MockClient,
    ollama: OllamaClient,
    /// `None` when `OPENAI_API_KEY` is not configured
    openai: Option<OpenAiClient>,
    /// `None` when `HF_API_KEY` is not configured
    hf: Option<OpenAiClient>,
    quota: CallQuota,
}

impl ProviderGateway {
    /// Build every backend from configuration. Missing keys are not an
    /// error until the corresponding provider is called.
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LlmError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        let openai = config.openai_api_key.as_ref().map(|key| {
            OpenAiClient::new(
                http.clone(),
                "OpenAI",
                &config.openai_base_url,
                key.clone(),
                config.openai_model.clone(),
                config.temperature,
            )
        });
        let hf = config.hf_api_key.as_ref().map(|key| {
            OpenAiClient::new(
                http.clone(),
                "Hugging Face",
                &config.hf_base_url,
                key.clone(),
                config.hf_model.clone(),
                config.temperature,
            )
        });

        Ok(Self {
            mock: MockClient::new(),
            ollama: OllamaClient::new(
                http,
                config.ollama_url.clone(),
                config.ollama_model.clone(),
            ),
            openai,
            hf,
            quota: CallQuota::new(config.max_calls),
        })
    }

    /// Check the credential, then admit the call against the quota.
    fn metered<'a>(
        &self,
        client: Option<&'a OpenAiClient>,
        key_var: &str,
    ) -> Result<&'a OpenAiClient, LlmError> {
        let client = client
            .ok_or_else(|| LlmError::configuration(format!("{} not set on the server.", key_var)))?;
        self.quota.acquire()?;
        Ok(client)
    }
}

#[async_trait]
impl LlmGateway for ProviderGateway {
    async fn send(&self, messages: &[ChatMessage], provider: Provider) -> Result<String, LlmError> {
        tracing::debug!(
            "Sending {} messages to provider={}",
            messages.len(),
            provider
        );

        let reply = match provider {
            Provider::Mock => self.mock.chat_completion(messages).await,
            Provider::Ollama => self.ollama.chat_completion(messages).await,
            Provider::OpenAi => {
                self.metered(self.openai.as_ref(), "OPENAI_API_KEY")?
                    .chat_completion(messages)
                    .await
            }
            Provider::Hf => {
                self.metered(self.hf.as_ref(), "HF_API_KEY")?
                    .chat_completion(messages)
                    .await
            }
        };

        if let Err(ref e) = reply {
            tracing::error!("LLM call to {} failed: {}", provider, e);
        }
        reply
    }

    fn quota(&self) -> Option<&CallQuota> {
        Some(&self.quota)
    }
}
