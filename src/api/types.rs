//! API request and response types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::agents::AgentError;
use crate::llm::{LlmErrorKind, Provider};
use crate::task::{Mode, StateError, TaskError, TaskId};

/// Request to plan a new goal.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanRequest {
    /// High-level user goal
    pub goal: String,

    /// `confirm` (default) or `auto`
    #[serde(default)]
    pub mode: Mode,

    /// Provider override (uses the configured default if not specified)
    #[serde(default)]
    pub provider: Option<Provider>,
}

/// Request naming one task.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskIdRequest {
    pub task_id: TaskId,
}

/// Request to edit a task's wording locally.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTaskRequest {
    pub task_id: TaskId,
    pub title: String,
    pub description: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,

    /// Provider used when a plan request names none
    pub default_provider: Provider,

    /// Metered calls admitted so far
    pub llm_calls_used: u64,

    /// Ceiling on metered calls, if enforced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_calls_limit: Option<u64>,
}

/// Error body: `{"detail": "..."}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// An HTTP error with a status and a human-readable detail.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn no_plan() -> Self {
        Self::bad_request("No plan found. Call /api/plan first.")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                detail: self.detail,
            }),
        )
            .into_response()
    }
}

impl From<TaskError> for ApiError {
    fn from(e: TaskError) -> Self {
        match e {
            TaskError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "Task not found."),
            TaskError::InvalidTransition { ref to, .. } => {
                Self::bad_request(format!("Only pending tasks can be {}.", to))
            }
            TaskError::EmptyTitle => Self::bad_request(e.to_string()),
        }
    }
}

impl From<StateError> for ApiError {
    fn from(e: StateError) -> Self {
        Self::bad_request(e.to_string())
    }
}

impl From<AgentError> for ApiError {
    fn from(e: AgentError) -> Self {
        match e {
            AgentError::Task(e) => e.into(),
            AgentError::State(e) => e.into(),
            AgentError::Llm(e) => {
                let status = match e.kind {
                    LlmErrorKind::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
                    LlmErrorKind::Configuration | LlmErrorKind::Transport => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                Self::new(status, e.message)
            }
            AgentError::Parse(_)
            | AgentError::MissingField(_)
            | AgentError::InvalidFieldType { .. }
            | AgentError::EmptyField(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }
}
