//! Parsing of model output for action-item extraction.
//!
//! The model is asked for a bare JSON array but frequently wraps it in a
//! markdown fence or returns something else entirely. Anything that cannot
//! be read as an array of objects yields no items; individual entries that
//! fail validation are dropped.

use docket_types::Priority;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// A validated action item as proposed by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItemCandidate {
    /// Trimmed, non-empty title.
    pub title: String,
    pub description: String,
    /// Raw due date text, expected to be ISO `YYYY-MM-DD`.
    pub due_date: Option<String>,
    /// One of low, medium or high.
    pub priority: Priority,
    pub requires_travel: bool,
    pub assignee: Option<String>,
}

/// Parse the model's raw extraction output.
pub fn parse_action_items(raw: &str) -> Vec<ActionItemCandidate> {
    let cleaned = strip_code_fences(raw);

    let value: Value = match serde_json::from_str(cleaned) {
        Ok(value) => value,
        Err(e) => {
            warn!(
                error = %e,
                response = %crate::prompts::head(cleaned, 200),
                "Could not parse action items as JSON"
            );
            return Vec::new();
        }
    };

    let Value::Array(entries) = value else {
        warn!("Action items response is not a list");
        return Vec::new();
    };

    let total = entries.len();
    let items: Vec<ActionItemCandidate> = entries
        .iter()
        .filter_map(|entry| entry.as_object().and_then(validate))
        .collect();
    debug!(total, kept = items.len(), "Action items extracted");
    items
}

fn validate(obj: &Map<String, Value>) -> Option<ActionItemCandidate> {
    let title = obj.get("title")?.as_str()?.trim();
    if title.is_empty() {
        return None;
    }

    Some(ActionItemCandidate {
        title: title.to_string(),
        description: string_field(obj, "description").unwrap_or_default(),
        due_date: string_field(obj, "due_date").filter(|d| !d.is_empty()),
        priority: coerce_priority(obj.get("priority")),
        requires_travel: coerce_bool(obj.get("requires_travel")),
        assignee: string_field(obj, "assignee").filter(|a| !a.is_empty()),
    })
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
}

/// Only low, medium and high are accepted from the model.
fn coerce_priority(value: Option<&Value>) -> Priority {
    match value.and_then(Value::as_str).map(|s| s.trim().to_lowercase()) {
        Some(p) if p == "low" => Priority::Low,
        Some(p) if p == "high" => Priority::High,
        _ => Priority::Medium,
    }
}

fn coerce_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "1"),
        _ => false,
    }
}

/// Strip markdown code fences from model output.
pub fn strip_code_fences(s: &str) -> &str {
    let mut s = s.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}
