//! Prompt text for the three agent roles.
//!
//! The mock backend recognises each role by the phrase its system prompt
//! opens with ("task planning assistant", "execution agent", "task rewriting
//! assistant"); keep those phrases intact.

use crate::llm::ChatMessage;
use crate::task::{AgentState, Task};

const PLANNER_SYSTEM: &str = r#"You are a task planning assistant.
Given a high-level goal, break it into 3 to 6 concrete tasks.
Each task must have a title and a short description.
Reply ONLY with valid JSON of the form:
{ "tasks": [ {"title": "...", "description": "..."}, ... ] }"#;

const EXECUTOR_SYSTEM: &str = r#"You are an execution agent.
You receive the user's overall goal and a single selected task.
You can only produce text output such as explanations, plans, code samples, summaries, or step-by-step instructions.
You cannot browse the internet. You cannot deploy websites. You cannot run code, create real files, or create real applications.
Be honest about what you actually did. Describe only actions that can be fully completed in text.
If the task cannot be fully completed using text alone but you can still provide a useful draft, outline, explanation, or set of instructions, set status to "needs_follow_up" and explain what remains.
If the core action of the task is impossible for you (for example sending an email, deploying a website, running code, accessing external systems, or browsing the internet) and you cannot meaningfully complete it even as a text-only draft, set status to "failed" and clearly explain why.
Reply ONLY with JSON:
{
  "status": "done" | "failed" | "needs_follow_up",
  "result": "plain text description of what you produced or tried to do",
  "reflection": "plain text notes on how it went and any next steps"
}
Default to "needs_follow_up" unless the task is clearly fully completed in text or clearly impossible for you.
Never claim that you deployed anything, ran tools, or created real files or applications.
Never put JSON, code objects, or Python dicts inside the "result" string.
Do not use Markdown, headings, bullet points, or bold text.
Avoid sequences like \n\n in the result string.
Keep result and reflection as simple plain text."#;

const REWRITER_SYSTEM: &str = r#"You are a task rewriting assistant.
You receive the user's overall goal and ONE existing task.
Rewrite the task title and description to be clearer, more concise, and more actionable, while keeping the same intent.
Reply ONLY with valid JSON:
{ "title": "...", "description": "..." }"#;

pub fn planning(goal: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(PLANNER_SYSTEM),
        ChatMessage::user(format!("User goal:\n{}", goal)),
    ]
}

pub fn execution(state: &AgentState, task: &Task) -> Vec<ChatMessage> {
    let task_list = state
        .tasks()
        .iter()
        .map(|t| format!("- [{}] {} (status: {})", t.id(), t.title(), t.status()))
        .collect::<Vec<_>>()
        .join("\n");

    let user = format!(
        "User goal:\n{goal}\n\nAll tasks:\n{task_list}\n\nSelected task (id {id}):\nTitle: {title}\nDescription: {description}\n",
        goal = state.goal(),
        task_list = task_list,
        id = task.id(),
        title = task.title(),
        description = task.description(),
    );

    vec![ChatMessage::system(EXECUTOR_SYSTEM), ChatMessage::user(user)]
}

pub fn regeneration(state: &AgentState, task: &Task) -> Vec<ChatMessage> {
    let user = format!(
        "User goal:\n{}\n\nExisting task:\nTitle: {}\nDescription: {}\n",
        state.goal(),
        task.title(),
        task.description()
    );

    vec![ChatMessage::system(REWRITER_SYSTEM), ChatMessage::user(user)]
}
