//! Regeneration: rewrite one task's title and description.
//!
//! Unlike planning and execution there is no safe default for a rewrite, so
//! any malformed reply is an error and the task is left untouched.

use super::prompts;
use super::response::RegenerationResponse;
use super::AgentError;
use crate::extract::extract_object;
use crate::llm::LlmGateway;
use crate::task::{AgentState, Task, TaskId};

/// Rewrite task `id`. Status, result and reflection are not touched.
pub async fn regenerate<'s>(
    llm: &dyn LlmGateway,
    state: &'s mut AgentState,
    id: TaskId,
) -> Result<&'s Task, AgentError> {
    let task = state.task(id)?;
    let messages = prompts::regeneration(state, task);

    let raw = llm.send(&messages, state.provider()).await?;

    let rewrite = RegenerationResponse::from_extraction(extract_object(&raw)).map_err(|e| {
        tracing::warn!("Task {}: rejected rewrite: {}", id, e);
        e
    })?;

    let task = state.task_mut(id)?;
    task.title = rewrite.title;
    task.description = rewrite.description;
    tracing::info!("Task {} regenerated: {}", id, task.title);
    Ok(task)
}
