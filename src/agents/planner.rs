//! Planning: turn a goal into a short ordered task list.
//!
//! Planning never fails on bad model output. If no usable task list can be
//! recovered, the fixed three-step default plan is returned instead. Only
//! gateway errors propagate.

use super::prompts;
use super::response::PlanResponse;
use super::AgentError;
use crate::extract::extract_object;
use crate::llm::{LlmGateway, Provider};
use crate::task::{Task, TaskId, TaskStatus};

const DEFAULT_PLAN: [(&str, &str); 3] = [
    (
        "Clarify the goal",
        "Restate the user's goal and constraints in simple terms.",
    ),
    (
        "Draft a first version",
        "Create a rough draft or plan that addresses the goal.",
    ),
    (
        "Review and refine",
        "Improve the draft, check for issues, and polish the result.",
    ),
];

/// The plan used whenever the model's reply yields no tasks.
pub fn default_plan() -> Vec<Task> {
    DEFAULT_PLAN
        .iter()
        .enumerate()
        .map(|(i, (title, description))| Task {
            id: TaskId::from_position(i),
            title: title.to_string(),
            description: description.to_string(),
            status: TaskStatus::Pending,
            result: None,
            reflection: None,
        })
        .collect()
}

/// Ask `provider` to decompose `goal`; ids are `1..=n` in reply order.
pub async fn plan(
    llm: &dyn LlmGateway,
    goal: &str,
    provider: Provider,
) -> Result<Vec<Task>, AgentError> {
    let goal = goal.trim();
    let raw = llm.send(&prompts::planning(goal), provider).await?;

    let extraction = extract_object(&raw);
    let tasks = extraction
        .fields()
        .and_then(PlanResponse::from_fields)
        .map(PlanResponse::into_tasks)
        .unwrap_or_default();

    if tasks.is_empty() {
        tracing::warn!(
            "No usable task list in {} reply ({} chars); using default plan",
            provider,
            raw.len()
        );
        return Ok(default_plan());
    }

    tracing::info!("Planned {} tasks with {}", tasks.len(), provider);
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::ScriptedGateway;
    use crate::llm::{LlmError, LlmErrorKind, MockClient};

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.title()).collect()
    }

    #[tokio::test]
    async fn uses_model_task_list() {
        let llm = ScriptedGateway::new([
            r#"Plan: {"tasks":[{"title":"Pick a topic","description":"d1"},{"title":"Write","description":"d2"}]}"#,
        ]);
        let tasks = plan(&llm, "Write a post", Provider::Ollama).await.unwrap();

        assert_eq!(titles(&tasks), ["Pick a topic", "Write"]);
        assert_eq!(tasks[1].id(), TaskId::new(2));
        assert_eq!(llm.providers(), [Provider::Ollama]);
    }

    #[tokio::test]
    async fn falls_back_on_unusable_replies() {
        for reply in [
            "I think you should start by thinking.",
            r#"{"tasks": []}"#,
            r#"{"tasks": "none"}"#,
            r#"{"plan": [{"title": "x"}]}"#,
            "[1, 2]",
        ] {
            let llm = ScriptedGateway::new([reply]);
            let tasks = plan(&llm, "goal", Provider::Mock).await.unwrap();
            assert_eq!(
                titles(&tasks),
                ["Clarify the goal", "Draft a first version", "Review and refine"],
                "reply {reply:?} should fall back"
            );
        }
    }

    #[tokio::test]
    async fn mock_provider_plan_is_the_three_step_plan() {
        let llm = ScriptedGateway::with_client(MockClient::new());
        for goal in ["", "Plan a trip to Lisbon"] {
            let tasks = plan(&llm, goal, Provider::Mock).await.unwrap();
            assert_eq!(tasks, default_plan());
            assert!(tasks.iter().all(|t| t.status() == TaskStatus::Pending));
        }
    }

    #[tokio::test]
    async fn gateway_errors_propagate() {
        let llm = ScriptedGateway::from_results([Err(LlmError::network("connection refused"))]);
        let err = plan(&llm, "goal", Provider::Ollama).await.unwrap_err();
        assert!(matches!(err, AgentError::Llm(ref e) if e.kind == LlmErrorKind::Transport));
    }
}
