//! Error type for agent operations.

use crate::llm::LlmError;
use crate::task::{StateError, TaskError};

/// Errors that can occur in agent operations.
///
/// Planning and execution only ever surface `Llm` (and `Task` for a bad
/// id); malformed model output degrades silently there. Regeneration is
/// strict and also surfaces the parse/field variants.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Failed to parse LLM response for regenerated task: {0}")]
    Parse(String),

    #[error("Regenerated task JSON missing '{0}' field")]
    MissingField(&'static str),

    #[error("Regenerated task '{field}' must be a string, got {found}")]
    InvalidFieldType { field: &'static str, found: String },

    #[error("Regenerated task '{0}' cannot be empty")]
    EmptyField(&'static str),

    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    #[error("{0}")]
    State(#[from] StateError),
}

impl AgentError {
    /// The gateway refused the call because the metered ceiling was reached.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, AgentError::Llm(e) if e.is_quota_exceeded())
    }
}
