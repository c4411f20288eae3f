//! Typed views of the three model replies.
//!
//! Each operation validates the extracted field mapping into its own
//! structure with named optional fields, so the fallback policy lives here
//! and not in scattered key lookups.

use serde_json::Value;

use super::AgentError;
use crate::extract::{Extraction, Fields};
use crate::task::{Task, TaskId, TaskStatus};

/// Render a JSON value as text. `null` counts as absent.
fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// `{"tasks": [{"title", "description"}, ...]}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanResponse {
    pub tasks: Vec<PlannedTask>,
}

/// One planned item as the model described it. Ids are never read from
/// the model.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlannedTask {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl PlanResponse {
    /// `None` when nothing was extracted or `tasks` is missing or not a list.
    pub fn from_fields(fields: &Fields) -> Option<Self> {
        let items = fields.get("tasks")?.as_array()?;
        Some(Self {
            tasks: items.iter().map(PlannedTask::from_value).collect(),
        })
    }

    /// Build pending tasks with ids `1..=n` in list order.
    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
            .into_iter()
            .enumerate()
            .map(|(i, planned)| planned.into_task(i))
            .collect()
    }
}

impl PlannedTask {
    fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(item) => Self {
                title: item.get("title").and_then(value_to_text),
                description: item.get("description").and_then(value_to_text),
            },
            Value::String(title) => Self {
                title: Some(title.clone()),
                description: None,
            },
            _ => Self::default(),
        }
    }

    fn into_task(self, index: usize) -> Task {
        let id = TaskId::from_position(index);
        let title = self
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("Task {}", id));
        Task {
            id,
            title,
            description: self.description.unwrap_or_default(),
            status: TaskStatus::Pending,
            result: None,
            reflection: None,
        }
    }
}

/// `{"status", "result", "reflection"}`, any of which may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionResponse {
    pub status: Option<String>,
    pub result: Option<String>,
    pub reflection: Option<String>,
}

/// Normalised execution outcome, ready to be written onto a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub status: TaskStatus,
    pub result: String,
    pub reflection: String,
}

impl ExecutionResponse {
    pub fn from_extraction(extraction: &Extraction) -> Self {
        let Some(fields) = extraction.fields() else {
            return Self::default();
        };
        let text = |key: &str| fields.get(key).and_then(value_to_text);
        Self {
            status: text("status"),
            result: text("result"),
            reflection: text("reflection"),
        }
    }

    /// Apply defaults: a status that is not an exact wire name, or is
    /// `pending`, becomes `needs_follow_up`; a missing result becomes the raw
    /// reply, a missing reflection becomes empty.
    pub fn resolve(self, raw: &str) -> ExecutionOutcome {
        let status = self
            .status
            .as_deref()
            .and_then(TaskStatus::parse)
            .filter(TaskStatus::is_execution_outcome)
            .unwrap_or(TaskStatus::NeedsFollowUp);

        ExecutionOutcome {
            status,
            result: self.result.unwrap_or_else(|| raw.to_string()),
            reflection: self.reflection.unwrap_or_default(),
        }
    }
}

/// `{"title", "description"}` for a rewritten task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegenerationResponse {
    pub title: String,
    pub description: String,
}

impl RegenerationResponse {
    /// Strict validation: a rewrite that cannot be trusted is an error.
    pub fn from_extraction(extraction: Extraction) -> Result<Self, AgentError> {
        let fields = match extraction {
            Extraction::Parsed(fields) | Extraction::Scraped(fields) => fields,
            Extraction::Failed(reason) => return Err(AgentError::Parse(reason)),
        };

        let title = match fields.get("title") {
            None => return Err(AgentError::MissingField("title")),
            Some(Value::String(title)) => title.clone(),
            Some(other) => {
                return Err(AgentError::InvalidFieldType {
                    field: "title",
                    found: json_type_name(other).to_string(),
                })
            }
        };
        if title.trim().is_empty() {
            return Err(AgentError::EmptyField("title"));
        }

        let description = fields
            .get("description")
            .and_then(value_to_text)
            .unwrap_or_default();

        Ok(Self { title, description })
    }
}
