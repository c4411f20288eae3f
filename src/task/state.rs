//! Session state: the goal, its planned tasks and the execution history.

use serde::{Deserialize, Serialize};

use super::task::{Task, TaskError, TaskId, TaskStatus};
use crate::llm::Provider;

/// How the agent proceeds after planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Plan first, execute only on explicit per-task calls
    #[default]
    Confirm,
    /// Run the whole plan immediately after planning
    Auto,
}

/// Full state of the agent for a single session.
///
/// # Invariants
/// - `goal` is non-empty and never changes
/// - task ids are unique; order is planning order
/// - `history` is append-only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    goal: String,
    mode: Mode,
    provider: Provider,
    tasks: Vec<Task>,
    history: Vec<String>,
}

impl AgentState {
    /// Create the state for a freshly planned goal.
    ///
    /// # Errors
    /// `StateError::EmptyGoal` if the goal is blank, `StateError::DuplicateId`
    /// if two tasks share an id.
    pub fn new(
        goal: impl Into<String>,
        mode: Mode,
        provider: Provider,
        tasks: Vec<Task>,
    ) -> Result<Self, StateError> {
        let goal = goal.into();
        if goal.trim().is_empty() {
            return Err(StateError::EmptyGoal);
        }
        for (i, task) in tasks.iter().enumerate() {
            if tasks[..i].iter().any(|t| t.id == task.id) {
                return Err(StateError::DuplicateId(task.id));
            }
        }
        Ok(Self {
            goal,
            mode,
            provider,
            tasks,
            history: Vec::new(),
        })
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn task(&self, id: TaskId) -> Result<&Task, TaskError> {
        self.tasks
            .iter()
            .find(|t| t.id == id)
            .ok_or(TaskError::NotFound(id))
    }

    pub fn task_mut(&mut self, id: TaskId) -> Result<&mut Task, TaskError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TaskError::NotFound(id))
    }

    pub(crate) fn position(&self, id: TaskId) -> Result<usize, TaskError> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(TaskError::NotFound(id))
    }

    /// First pending task in planning order.
    pub fn next_pending(&self) -> Option<TaskId> {
        self.tasks
            .iter()
            .find(|t| t.status.is_pending())
            .map(|t| t.id)
    }

    /// No task is left pending.
    pub fn is_finished(&self) -> bool {
        self.next_pending().is_none()
    }

    /// Number of tasks currently in `status`.
    pub fn count(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }

    /// Cancel one pending task. No model call is involved.
    pub fn cancel(&mut self, id: TaskId) -> Result<&Task, TaskError> {
        let task = self.task_mut(id)?;
        task.cancel()?;
        Ok(task)
    }

    /// Write an execution outcome onto the task at `index` and append the
    /// matching history entry.
    pub(crate) fn record_execution(
        &mut self,
        index: usize,
        status: TaskStatus,
        result: String,
        reflection: String,
    ) -> &Task {
        let task = &mut self.tasks[index];
        task.apply_execution(status, result, reflection);
        let entry = history_entry(task);
        self.history.push(entry);
        &self.tasks[index]
    }
}

/// Fixed-format audit entry for one execution.
fn history_entry(task: &Task) -> String {
    format!(
        "Selected task {}: {}\nStatus: {}\nResult:\n{}\nReflection:\n{}\n-------------------------",
        task.id,
        task.title,
        task.status,
        task.result.as_deref().unwrap_or_default(),
        task.reflection.as_deref().unwrap_or_default(),
    )
}

/// Errors raised while building a session state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("Goal cannot be empty")]
    EmptyGoal,

    #[error("Duplicate task id {0}")]
    DuplicateId(TaskId),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AgentState {
        let tasks = (0..3)
            .map(|i| Task::new(TaskId::from_position(i), format!("Task {}", i + 1), "").unwrap())
            .collect();
        AgentState::new("Ship the report", Mode::Confirm, Provider::Mock, tasks).unwrap()
    }

    #[test]
    fn blank_goal_is_rejected() {
        let err = AgentState::new("  ", Mode::Auto, Provider::Mock, vec![]).unwrap_err();
        assert_eq!(err, StateError::EmptyGoal);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let tasks = vec![
            Task::new(TaskId::new(1), "a", "").unwrap(),
            Task::new(TaskId::new(1), "b", "").unwrap(),
        ];
        let err = AgentState::new("goal", Mode::Confirm, Provider::Mock, tasks).unwrap_err();
        assert_eq!(err, StateError::DuplicateId(TaskId::new(1)));
    }

    #[test]
    fn next_pending_skips_cancelled_and_executed() {
        let mut state = state();
        assert_eq!(state.next_pending(), Some(TaskId::new(1)));

        state.cancel(TaskId::new(1)).unwrap();
        state.record_execution(1, TaskStatus::Done, "r".into(), "f".into());
        assert_eq!(state.next_pending(), Some(TaskId::new(3)));

        state.record_execution(2, TaskStatus::Failed, "r".into(), "f".into());
        assert!(state.is_finished());
        assert_eq!(state.count(TaskStatus::Cancelled), 1);
    }

    #[test]
    fn record_execution_appends_fixed_format_entry() {
        let mut state = state();
        state.record_execution(0, TaskStatus::NeedsFollowUp, "draft".into(), "next".into());

        assert_eq!(state.history().len(), 1);
        assert_eq!(
            state.history()[0],
            "Selected task 1: Task 1\nStatus: needs_follow_up\nResult:\ndraft\nReflection:\nnext\n-------------------------"
        );
    }

    #[test]
    fn unknown_task_id_is_not_found() {
        let mut state = state();
        assert_eq!(
            state.cancel(TaskId::new(9)).unwrap_err(),
            TaskError::NotFound(TaskId::new(9))
        );
    }

    #[test]
    fn serializes_to_wire_shape() {
        let json = serde_json::to_value(state()).unwrap();
        assert_eq!(json["goal"], "Ship the report");
        assert_eq!(json["mode"], "confirm");
        assert_eq!(json["provider"], "mock");
        assert_eq!(json["tasks"].as_array().unwrap().len(), 3);
        assert!(json["history"].as_array().unwrap().is_empty());
    }
}
