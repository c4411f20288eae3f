//! Configuration management for the task agent.
//!
//! Configuration can be set via environment variables:
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `8000`.
//! - `LLM_PROVIDER` - Optional. Provider used when a plan request names none. Defaults to `mock`.
//! - `STATIC_DIR` - Optional. Directory holding the web frontend. Defaults to `static`.
//! - `MAX_SESSIONS` - Optional. Sessions kept in memory before the least recently planned is evicted. Defaults to `100`.
//! - `OLLAMA_HOST` - Optional. Defaults to `http://localhost:11434`.
//! - `OLLAMA_URL` - Optional. Chat endpoint. Defaults to `{OLLAMA_HOST}/api/chat`.
//! - `OLLAMA_MODEL` - Optional. Defaults to `llama3.2`.
//! - `OPENAI_API_KEY` - Required only when the `openai` provider is used.
//! - `OPENAI_MODEL` - Optional. Defaults to `gpt-4.1-mini`.
//! - `OPENAI_BASE_URL` - Optional. Defaults to `https://api.openai.com/v1`.
//! - `HF_API_KEY` - Required only when the `hf` provider is used.
//! - `HF_MODEL` - Optional. Defaults to `openai/gpt-oss-20b`.
//! - `HF_BASE_URL` - Optional. Defaults to `https://router.huggingface.co/v1`.
//! - `MAX_LLM_CALLS` - Optional. Ceiling for metered (openai/hf) calls. Defaults to `1000`.
//! - `LLM_TIMEOUT_SECS` - Optional. Per-request timeout. Defaults to `60`.
//! - `LLM_TEMPERATURE` - Optional. Sampling temperature for hosted providers. Defaults to `0.4`.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::llm::Provider;

const DEFAULT_MAX_SESSIONS: usize = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Settings for the language-model backends.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Full URL of the Ollama chat endpoint
    pub ollama_url: String,

    /// Ollama model name
    pub ollama_model: String,

    /// OpenAI API key (checked per call, not at startup)
    pub openai_api_key: Option<String>,

    pub openai_model: String,

    /// Base URL of the OpenAI-compatible API
    pub openai_base_url: String,

    /// Hugging Face API key (checked per call, not at startup)
    pub hf_api_key: Option<String>,

    pub hf_model: String,

    /// Base URL of the Hugging Face OpenAI-compatible router
    pub hf_base_url: String,

    /// Ceiling on admitted calls to metered providers
    pub max_calls: u64,

    /// Timeout applied to every backend request
    pub request_timeout: Duration,

    /// Sampling temperature for hosted providers
    pub temperature: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434/api/chat".to_string(),
            ollama_model: "llama3.2".to_string(),
            openai_api_key: None,
            openai_model: "gpt-4.1-mini".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            hf_api_key: None,
            hf_model: "openai/gpt-oss-20b".to_string(),
            hf_base_url: "https://router.huggingface.co/v1".to_string(),
            max_calls: 1000,
            request_timeout: Duration::from_secs(60),
            temperature: 0.4,
        }
    }
}

impl LlmConfig {
    /// Load backend settings from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let ollama_host = std::env::var("OLLAMA_HOST")
            .unwrap_or_else(|_| "http://localhost:11434".to_string());
        let ollama_url = std::env::var("OLLAMA_URL")
            .unwrap_or_else(|_| format!("{}/api/chat", ollama_host.trim_end_matches('/')));

        Ok(Self {
            ollama_url,
            ollama_model: env_or("OLLAMA_MODEL", defaults.ollama_model),
            openai_api_key: non_empty_env("OPENAI_API_KEY"),
            openai_model: env_or("OPENAI_MODEL", defaults.openai_model),
            openai_base_url: env_or("OPENAI_BASE_URL", defaults.openai_base_url),
            hf_api_key: non_empty_env("HF_API_KEY"),
            hf_model: env_or("HF_MODEL", defaults.hf_model),
            hf_base_url: env_or("HF_BASE_URL", defaults.hf_base_url),
            max_calls: parse_env("MAX_LLM_CALLS", defaults.max_calls)?,
            request_timeout: Duration::from_secs(parse_env(
                "LLM_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
            temperature: parse_env("LLM_TEMPERATURE", defaults.temperature)?,
        })
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Provider used when a plan request does not name one
    pub default_provider: Provider,

    /// Directory holding `index.html` and its assets
    pub static_dir: PathBuf,

    /// Upper bound on in-memory sessions
    pub max_sessions: usize,

    /// Backend settings
    pub llm: LlmConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric variable or
    /// `LLM_PROVIDER` cannot be parsed. Missing credentials are not an
    /// error here; they surface when the provider is first used.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_or("HOST", "127.0.0.1".to_string());
        let port = parse_env("PORT", 8000u16)?;

        let default_provider = match std::env::var("LLM_PROVIDER") {
            Ok(value) => Provider::from_str(&value)
                .map_err(|e| ConfigError::InvalidValue("LLM_PROVIDER".to_string(), e))?,
            Err(_) => Provider::Mock,
        };

        let static_dir = std::env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("static"));

        Ok(Self {
            host,
            port,
            default_provider,
            static_dir,
            max_sessions: parse_env("MAX_SESSIONS", DEFAULT_MAX_SESSIONS)?,
            llm: LlmConfig::from_env()?,
        })
    }

    /// Create a config with default values (useful for testing).
    pub fn new(default_provider: Provider) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            default_provider,
            static_dir: PathBuf::from("static"),
            max_sessions: DEFAULT_MAX_SESSIONS,
            llm: LlmConfig::default(),
        }
    }
}

fn env_or(name: &str, default: String) -> String {
    std::env::var(name).unwrap_or(default)
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e))),
        Err(_) => Ok(default),
    }
}
