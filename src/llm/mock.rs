//! Offline backend returning canned JSON replies.
//!
//! The reply is picked by looking for the role phrase each agent prompt
//! opens with, so the whole plan/execute/rewrite flow works without a model.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde_json::json;

use super::{ChatMessage, LlmClient, LlmError};

const REWRITE_VARIANTS: [(&str, &str); 4] = [
    (
        "Refined task title",
        "A clearer and more concise version of the original task description.",
    ),
    (
        "Improved task wording",
        "Updated description that keeps the same intent but is easier to follow.",
    ),
    (
        "Simplified task title",
        "A shorter description that keeps the important details and makes the task actionable.",
    ),
    (
        "Clear task statement",
        "Restated description that focuses on the main goal of the task in plain language.",
    ),
];

/// Canned-reply backend. Never fails.
#[derive(Debug, Default, Clone)]
pub struct MockClient;

impl MockClient {
    pub fn new() -> Self {
        Self
    }

    fn reply(messages: &[ChatMessage]) -> serde_json::Value {
        let full_text = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        if full_text.contains("task planning assistant") {
            return json!({
                "tasks": [
                    {
                        "title": "Clarify the goal",
                        "description": "Restate the user's goal and constraints in simple terms."
                    },
                    {
                        "title": "Draft a first version",
                        "description": "Create a rough draft or plan that addresses the goal."
                    },
                    {
                        "title": "Review and refine",
                        "description": "Improve the draft, check for issues, and polish the result."
                    }
                ]
            });
        }

        if full_text.contains("execution agent") {
            return json!({
                "status": "done",
                "result": "Executed this task in mock mode. In a real setup, I would use an LLM \
                           to generate detailed text, analysis, or plans.",
                "reflection": "Execution went well. In a real system, this reflection would explain \
                               what worked and what to do next."
            });
        }

        if full_text.contains("task rewriting assistant") {
            let (title, description) = REWRITE_VARIANTS
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or(REWRITE_VARIANTS[0]);
            return json!({ "title": title, "description": description });
        }

        json!({
            "status": "done",
            "result": "Mock response: no specific handler detected.",
            "reflection": "This is a fallback mock reply."
        })
    }
}

#[async_trait]
impl LlmClient for MockClient {
    async fn chat_completion(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        Ok(Self::reply(messages).to_string())
    }
}
