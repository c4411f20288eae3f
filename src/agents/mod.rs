//! Agent core - planning, execution, and rewriting of tasks.
//!
//! # Operations
//! - **plan**: goal → ordered task list (falls back to a default plan)
//! - **execute**: one task → status/result/reflection + history entry
//! - **run_all**: execute pending tasks in order until none remain
//! - **regenerate**: rewrite one task's wording (strict)
//!
//! # Design Principles
//! - The core holds no session state; it only mutates the
//!   [`AgentState`] it is handed
//! - One gateway call per operation, no retries
//! - Planning and execution degrade silently on malformed output;
//!   regeneration fails loudly

mod executor;
mod planner;
mod prompts;
pub mod response;
mod rewriter;
mod types;

pub use planner::default_plan;
pub use types::AgentError;

use std::sync::Arc;

use crate::llm::{LlmGateway, Provider};
use crate::task::{AgentState, Mode, StateError, Task, TaskId};

/// Shared handle to the agent core.
///
/// Cheap to clone; all clones talk to the same gateway.
#[derive(Clone)]
pub struct TaskAgent {
    llm: Arc<dyn LlmGateway>,
}

impl TaskAgent {
    pub fn new(llm: Arc<dyn LlmGateway>) -> Self {
        Self { llm }
    }

    pub fn gateway(&self) -> &dyn LlmGateway {
        self.llm.as_ref()
    }

    /// Decompose `goal` into tasks with ids `1..=n`.
    pub async fn plan(&self, goal: &str, provider: Provider) -> Result<Vec<Task>, AgentError> {
        planner::plan(self.gateway(), goal, provider).await
    }

    /// Plan `goal` into a new session state; in `Auto` mode the whole plan
    /// is executed before returning.
    pub async fn start(
        &self,
        goal: &str,
        mode: Mode,
        provider: Provider,
    ) -> Result<AgentState, AgentError> {
        let goal = goal.trim();
        if goal.is_empty() {
            return Err(StateError::EmptyGoal.into());
        }
        let tasks = self.plan(goal, provider).await?;
        let mut state = AgentState::new(goal, mode, provider, tasks)?;

        if mode == Mode::Auto {
            self.run_all(&mut state).await?;
        }
        Ok(state)
    }

    /// Execute task `id` once and append to the history.
    pub async fn execute<'s>(
        &self,
        state: &'s mut AgentState,
        id: TaskId,
    ) -> Result<&'s Task, AgentError> {
        executor::execute(self.gateway(), state, id).await
    }

    /// Execute every pending task in order. Returns how many were executed.
    pub async fn run_all(&self, state: &mut AgentState) -> Result<usize, AgentError> {
        executor::run_all(self.gateway(), state).await
    }

    /// Rewrite the title and description of task `id`.
    pub async fn regenerate<'s>(
        &self,
        state: &'s mut AgentState,
        id: TaskId,
    ) -> Result<&'s Task, AgentError> {
        rewriter::regenerate(self.gateway(), state, id).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted gateway for agent and API tests.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::llm::{ChatMessage, LlmClient, LlmError, LlmGateway, Provider};

    enum Source {
        Script(Mutex<VecDeque<Result<String, LlmError>>>),
        Client(Box<dyn LlmClient>),
    }

    /// Replies from a queue (or a real client) and records every call.
    pub struct ScriptedGateway {
        source: Source,
        calls: Mutex<Vec<(Provider, Vec<ChatMessage>)>>,
    }

    impl ScriptedGateway {
        pub fn new<I, S>(replies: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self::from_results(replies.into_iter().map(|r| Ok(r.into())))
        }

        pub fn from_results(results: impl IntoIterator<Item = Result<String, LlmError>>) -> Self {
            Self {
                source: Source::Script(Mutex::new(results.into_iter().collect())),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn with_client(client: impl LlmClient + 'static) -> Self {
            Self {
                source: Source::Client(Box::new(client)),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn providers(&self) -> Vec<Provider> {
            self.calls.lock().unwrap().iter().map(|(p, _)| *p).collect()
        }
    }

    #[async_trait]
    impl LlmGateway for ScriptedGateway {
        async fn send(
            &self,
            messages: &[ChatMessage],
            provider: Provider,
        ) -> Result<String, LlmError> {
            self.calls
                .lock()
                .unwrap()
                .push((provider, messages.to_vec()));
            let client = match &self.source {
                Source::Script(queue) => {
                    let next = queue.lock().unwrap().pop_front();
                    return next.unwrap_or_else(|| Err(LlmError::network("script exhausted")));
                }
                Source::Client(client) => client,
            };
            client.chat_completion(messages).await
        }
    }
}
