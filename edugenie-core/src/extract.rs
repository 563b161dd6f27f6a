//! Tolerant JSON recovery from model output
//!
//! Models asked for JSON often wrap it in prose or a markdown fence. The
//! extractor tries, in order: the whole reply, the first fenced block, and
//! the span from the first opening bracket to the last matching closer.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Outcome of extracting JSON from a reply
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    /// A JSON value was recovered
    Parsed(Value),
    /// No candidate parsed
    Malformed { reason: String },
}

impl Extracted {
    /// Convert into a `Result`, keeping the failure reason
    pub fn into_result(self) -> Result<Value, String> {
        match self {
            Extracted::Parsed(value) => Ok(value),
            Extracted::Malformed { reason } => Err(reason),
        }
    }
}

fn fence_pattern() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```[A-Za-z0-9_-]*\s*\n?(.*?)```").expect("fence pattern is valid")
    })
}

/// Span from the first `open` to the last `close`, if ordered
fn bracket_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// Recover a JSON value from a model reply
pub fn extract_json(text: &str) -> Extracted {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Extracted::Malformed {
            reason: "empty response from model".to_string(),
        };
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Extracted::Parsed(value);
    }

    if let Some(block) = fence_pattern().captures(trimmed).and_then(|cap| cap.get(1)) {
        if let Ok(value) = serde_json::from_str::<Value>(block.as_str().trim()) {
            return Extracted::Parsed(value);
        }
    }

    // Prefer whichever bracket kind opens first
    let object_start = trimmed.find('{');
    let array_start = trimmed.find('[');
    let order = match (object_start, array_start) {
        (Some(o), Some(a)) if a < o => [('[', ']'), ('{', '}')],
        _ => [('{', '}'), ('[', ']')],
    };

    let mut last_error = None;
    for (open, close) in order {
        if let Some(span) = bracket_span(trimmed, open, close) {
            match serde_json::from_str::<Value>(span) {
                Ok(value) => return Extracted::Parsed(value),
                Err(e) => last_error = Some(e.to_string()),
            }
        }
    }

    Extracted::Malformed {
        reason: last_error.unwrap_or_else(|| "no JSON object or array found in model output".to_string()),
    }
}
