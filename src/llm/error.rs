//! LLM gateway error types.
//!
//! Distinguishes between configuration problems (fatal, caller must fix the
//! environment), transport failures (backend unreachable or misbehaving) and
//! the local call ceiling for metered providers (retryable by waiting).
//! Nothing here is retried internally.

/// Error from an LLM gateway call.
#[derive(Debug, Clone)]
pub struct LlmError {
    /// The kind of error
    pub kind: LlmErrorKind,
    /// HTTP status code returned by the backend, if any
    pub status_code: Option<u16>,
    /// Error message
    pub message: String,
}

impl LlmError {
    /// A required credential or setting is missing.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self {
            kind: LlmErrorKind::Configuration,
            status_code: None,
            message: message.into(),
        }
    }

    /// The backend could not be reached or timed out.
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: LlmErrorKind::Transport,
            status_code: None,
            message: message.into(),
        }
    }

    /// The backend answered with a non-success status.
    pub fn http_status(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            kind: LlmErrorKind::Transport,
            status_code: Some(status_code),
            message: message.into(),
        }
    }

    /// The backend answered, but not with text where text was expected.
    pub fn unexpected_payload(message: impl Into<String>) -> Self {
        Self {
            kind: LlmErrorKind::Transport,
            status_code: None,
            message: message.into(),
        }
    }

    /// The local call ceiling for metered providers was reached.
    pub fn quota_exceeded(limit: u64) -> Self {
        Self {
            kind: LlmErrorKind::QuotaExceeded,
            status_code: None,
            message: format!(
                "Demo LLM usage limit reached ({} calls). Please try again later.",
                limit
            ),
        }
    }

    pub fn is_quota_exceeded(&self) -> bool {
        self.kind == LlmErrorKind::QuotaExceeded
    }
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "{} (HTTP {}): {}", self.kind, code, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for LlmError {}

/// Classification of LLM errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Missing credential for a non-mock provider
    Configuration,
    /// Network failure, non-2xx status, or a reply without text
    Transport,
    /// Local call-count ceiling reached (openai / hf only)
    QuotaExceeded,
}

impl std::fmt::Display for LlmErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmErrorKind::Configuration => write!(f, "Configuration error"),
            LlmErrorKind::Transport => write!(f, "Transport error"),
            LlmErrorKind::QuotaExceeded => write!(f, "Quota exceeded"),
        }
    }
}
