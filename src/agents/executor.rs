//! Execution: ask the model to perform one task in text, and the batch loop.
//!
//! # Algorithm
//! 1. Prompt with the goal, every task's status, and the selected task
//! 2. Recover `status` / `result` / `reflection`, scraping if needed
//! 3. Normalise (see [`ExecutionResponse::resolve`]) and write onto the task
//! 4. Append one history entry
//!
//! Malformed output never fails an execution; only gateway errors do.

use super::prompts;
use super::response::ExecutionResponse;
use super::AgentError;
use crate::extract::{extract_execution_object, Extraction};
use crate::llm::LlmGateway;
use crate::task::{AgentState, Task, TaskId};

/// Execute task `id` once, overwriting any earlier result.
pub async fn execute<'s>(
    llm: &dyn LlmGateway,
    state: &'s mut AgentState,
    id: TaskId,
) -> Result<&'s Task, AgentError> {
    let index = state.position(id)?;
    let messages = prompts::execution(state, &state.tasks()[index]);

    let raw = llm.send(&messages, state.provider()).await?;

    let extraction = extract_execution_object(&raw);
    match &extraction {
        Extraction::Parsed(_) => {}
        Extraction::Scraped(fields) => tracing::warn!(
            "Task {}: malformed execution reply, recovered {} field(s)",
            id,
            fields.len()
        ),
        Extraction::Failed(reason) => tracing::warn!(
            "Task {}: unparseable execution reply ({}); keeping raw text",
            id,
            reason
        ),
    }

    let outcome = ExecutionResponse::from_extraction(&extraction).resolve(&raw);
    tracing::info!("Task {} executed: status={}", id, outcome.status);

    Ok(state.record_execution(index, outcome.status, outcome.result, outcome.reflection))
}

/// Execute pending tasks in list order until none is left.
///
/// Each execution moves its task out of `pending`, so the loop performs at
/// most one call per task and none when the plan is already finished.
/// Returns the number of tasks executed.
pub async fn run_all(llm: &dyn LlmGateway, state: &mut AgentState) -> Result<usize, AgentError> {
    let mut executed = 0;
    while let Some(id) = state.next_pending() {
        execute(llm, state, id).await?;
        executed += 1;
    }

    if executed > 0 {
        tracing::info!(
            "Execution loop finished: {} task(s) executed, {} in history",
            executed,
            state.history().len()
        );
    }
    Ok(executed)
}
