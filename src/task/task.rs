//! Core Task type and its status lifecycle.
//!
//! # Invariants
//! - `id` is unique within an [`AgentState`](super::AgentState) and never changes
//! - `title` is non-empty
//! - `result` / `reflection` are only ever set by execution

use serde::{Deserialize, Serialize};

/// Identifier of a task within one plan.
///
/// # Properties
/// - Positive, assigned from the 1-based position in the planned list
/// - Immutable once created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u32);

impl TaskId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Id for the task at zero-based `index` of a plan.
    pub fn from_position(index: usize) -> Self {
        Self(index as u32 + 1)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a task in its lifecycle.
///
/// # State Machine
/// ```text
/// Pending -> Done
///        \-> Failed
///        \-> NeedsFollowUp
///        \-> Cancelled (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Planned, not yet executed
    #[default]
    Pending,
    /// Fully completed in text
    Done,
    /// Core action impossible in text
    Failed,
    /// Partial result, draft or ambiguous outcome
    NeedsFollowUp,
    /// Withdrawn by the user before execution
    Cancelled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Pending,
        TaskStatus::Done,
        TaskStatus::Failed,
        TaskStatus::NeedsFollowUp,
        TaskStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Done => "done",
            TaskStatus::Failed => "failed",
            TaskStatus::NeedsFollowUp => "needs_follow_up",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Parse the wire name of a status. Returns `None` for anything else.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, TaskStatus::Pending)
    }

    /// Whether an execution attempt may leave a task in this status.
    /// Any status but `Pending` qualifies, so the batch loop always advances.
    pub fn is_execution_outcome(&self) -> bool {
        !self.is_pending()
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One atomic unit of planned work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub(crate) id: TaskId,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) status: TaskStatus,
    pub(crate) result: Option<String>,
    pub(crate) reflection: Option<String>,
}

impl Task {
    /// Create a pending task.
    ///
    /// # Errors
    /// Returns `TaskError::EmptyTitle` if `title` is blank.
    pub fn new(
        id: TaskId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, TaskError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(TaskError::EmptyTitle);
        }
        Ok(Self {
            id,
            title,
            description: description.into(),
            status: TaskStatus::Pending,
            result: None,
            reflection: None,
        })
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn reflection(&self) -> Option<&str> {
        self.reflection.as_deref()
    }

    /// Replace title and description; status and execution output are kept.
    pub fn update_fields(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<(), TaskError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(TaskError::EmptyTitle);
        }
        self.title = title;
        self.description = description.into();
        Ok(())
    }

    /// Store the outcome of an execution attempt, overwriting any earlier one.
    ///
    /// # Precondition
    /// `status.is_execution_outcome()`
    pub(crate) fn apply_execution(&mut self, status: TaskStatus, result: String, reflection: String) {
        debug_assert!(status.is_execution_outcome());
        self.status = status;
        self.result = Some(result);
        self.reflection = Some(reflection);
    }

    /// Transition the task to Cancelled.
    ///
    /// # Precondition
    /// `self.status == Pending`
    pub fn cancel(&mut self) -> Result<(), TaskError> {
        self.ensure_pending("cancelled")?;
        self.status = TaskStatus::Cancelled;
        Ok(())
    }

    /// Fail with `InvalidTransition` unless the task is still pending.
    pub fn ensure_pending(&self, to: &str) -> Result<(), TaskError> {
        if self.status.is_pending() {
            Ok(())
        } else {
            Err(TaskError::InvalidTransition {
                id: self.id,
                from: self.status,
                to: to.to_string(),
            })
        }
    }
}

/// Errors that can occur during task operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("Task title cannot be empty")]
    EmptyTitle,

    #[error("Task {0} not found")]
    NotFound(TaskId),

    #[error("Task {id} cannot move from {from} to {to}: only pending tasks can be {to}")]
    InvalidTransition {
        id: TaskId,
        from: TaskStatus,
        to: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> Task {
        Task::new(TaskId::new(1), "Write outline", "Sections and headings").unwrap()
    }

    #[test]
    fn new_task_starts_pending_without_output() {
        let task = pending();
        assert_eq!(task.status(), TaskStatus::Pending);
        assert!(task.result().is_none());
        assert!(task.reflection().is_none());
    }

    #[test]
    fn blank_title_is_rejected() {
        assert_eq!(
            Task::new(TaskId::new(1), "   ", "").unwrap_err(),
            TaskError::EmptyTitle
        );
    }

    #[test]
    fn status_wire_names_round_through_parse() {
        for status in TaskStatus::ALL {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::parse("maybe"), None);
        assert_eq!(
            serde_json::to_string(&TaskStatus::NeedsFollowUp).unwrap(),
            "\"needs_follow_up\""
        );
    }

    #[test]
    fn cancel_only_from_pending() {
        let mut task = pending();
        task.cancel().expect("pending task can be cancelled");
        assert_eq!(task.status(), TaskStatus::Cancelled);

        let err = task.cancel().unwrap_err();
        assert!(matches!(err, TaskError::InvalidTransition { from: TaskStatus::Cancelled, .. }));
    }

    #[test]
    fn cancel_rejected_after_execution() {
        let mut task = pending();
        task.apply_execution(TaskStatus::Done, "ok".into(), String::new());
        assert!(task.cancel().is_err());
        assert_eq!(task.status(), TaskStatus::Done);
    }

    #[test]
    fn update_fields_keeps_status_and_output() {
        let mut task = pending();
        task.apply_execution(TaskStatus::NeedsFollowUp, "draft".into(), "more".into());
        task.update_fields("New title", "New description").unwrap();
        assert_eq!(task.title(), "New title");
        assert_eq!(task.status(), TaskStatus::NeedsFollowUp);
        assert_eq!(task.result(), Some("draft"));
        assert_eq!(task.update_fields("", "x"), Err(TaskError::EmptyTitle));
    }

    #[test]
    fn serializes_with_flat_numeric_id() {
        let json = serde_json::to_value(pending()).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["status"], "pending");
        assert!(json["result"].is_null());
    }
}
