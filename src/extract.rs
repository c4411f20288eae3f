//! Best-effort recovery of JSON objects from free-form model text.
//!
//! Models are asked to reply with a bare JSON object but routinely wrap it in
//! prose or code fences, or emit something that only resembles JSON. The
//! functions here never fail: they report what they could recover as an
//! [`Extraction`] and leave the policy (fallback or error) to the caller.
//! They know nothing about tasks.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

/// Field mapping recovered from model text.
pub type Fields = Map<String, Value>;

/// Outcome of an extraction attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// The text, or its outermost `{...}` span, parsed as a JSON object
    Parsed(Fields),
    /// Some known fields were scraped by pattern from malformed text
    Scraped(Fields),
    /// Nothing usable was found
    Failed(String),
}

impl Extraction {
    pub fn fields(&self) -> Option<&Fields> {
        match self {
            Extraction::Parsed(fields) | Extraction::Scraped(fields) => Some(fields),
            Extraction::Failed(_) => None,
        }
    }

    pub fn into_fields(self) -> Option<Fields> {
        match self {
            Extraction::Parsed(fields) | Extraction::Scraped(fields) => Some(fields),
            Extraction::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Extraction::Failed(_))
    }
}

/// Recover a JSON object from `raw`.
///
/// Tries, in order:
/// 1. the whole text as a JSON object (arrays and scalars do not count)
/// 2. the span from the first `{` to the last `}` as a JSON object
pub fn extract_object(raw: &str) -> Extraction {
    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(raw) {
        return Extraction::Parsed(fields);
    }

    let Some(span) = outer_brace_span(raw) else {
        return Extraction::Failed("no JSON object found in model output".to_string());
    };

    match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(fields)) => Extraction::Parsed(fields),
        Ok(_) => Extraction::Failed("embedded JSON is not an object".to_string()),
        Err(e) => Extraction::Failed(format!("embedded JSON is malformed: {}", e)),
    }
}

/// Recover an execution reply (`status`, `result`, `reflection`).
///
/// Falls back to scraping the three fields independently when no object can
/// be parsed. The `result` pattern only matches when a `reflection` key
/// follows it, so replies with a different key order yield fewer fields.
pub fn extract_execution_object(raw: &str) -> Extraction {
    let parsed = extract_object(raw);
    let reason = match parsed {
        Extraction::Failed(reason) => reason,
        found => return found,
    };

    let mut fields = Fields::new();
    for (key, pattern) in execution_patterns() {
        if let Some(value) = pattern.captures(raw).and_then(|c| c.get(1)) {
            fields.insert((*key).to_string(), Value::String(value.as_str().to_string()));
        }
    }

    if fields.is_empty() {
        Extraction::Failed(reason)
    } else {
        tracing::debug!(
            "Scraped {} execution field(s) from malformed output ({})",
            fields.len(),
            reason
        );
        Extraction::Scraped(fields)
    }
}

/// First `{` through last `}`, if the last comes after the first.
fn outer_brace_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

fn execution_patterns() -> &'static [(&'static str, Regex); 3] {
    static PATTERNS: OnceLock<[(&'static str, Regex); 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (
                "status",
                Regex::new(r#""status"\s*:\s*"([^"]+)""#).expect("valid status pattern"),
            ),
            (
                "result",
                Regex::new(r#""result"\s*:\s*"([\s\S]*?)"\s*,\s*"reflection""#)
                    .expect("valid result pattern"),
            ),
            (
                "reflection",
                Regex::new(r#""reflection"\s*:\s*"([\s\S]*?)"\s*\}?"#)
                    .expect("valid reflection pattern"),
            ),
        ]
    })
}
