//! Turn composition for chat-style requests

use super::budget::Budget;
use super::detector::CONTINUATION_MARKER;
use crate::protocol::{ConversationTurn, Role};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Instruction sent as the final turn of a "continue" request
pub const CONTINUE_DIRECTIVE: &str =
    "Continue exactly where you left off. Do not repeat anything you have already written.";

/// User turn appended between stitched chunks
pub const CONTINUE_TURN: &str = "continue";

/// Marker appended to a document cut to its budget
pub const TRUNCATION_ELLIPSIS: &str = "...";

/// A history entry as front-ends send it.
///
/// Deserialization never fails: entries of the wrong shape or type come out
/// with missing fields and are dropped during composition. The text is read
/// from `text`, falling back to `content`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub role: Option<String>,
    pub text: Option<String>,
}

impl<'de> Deserialize<'de> for HistoryEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let field = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);

        Ok(Self {
            role: field("role"),
            text: field("text").or_else(|| field("content")),
        })
    }
}

impl HistoryEntry {
    /// Create a well-formed entry
    pub fn new(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            text: Some(text.into()),
        }
    }

    /// Convert to a turn; `None` for missing fields, unknown roles or system turns
    pub fn to_turn(&self) -> Option<ConversationTurn> {
        let role = Role::parse_lenient(self.role.as_deref()?)?;
        if role == Role::System {
            return None;
        }
        let text = self.text.as_deref()?.trim();
        if text.is_empty() {
            return None;
        }
        Some(ConversationTurn::new(role, text))
    }
}

/// Document text injected into the system turn
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    #[serde(default)]
    pub name: String,

    #[serde(alias = "text")]
    pub content: String,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// What the last turn of a request carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalTurn {
    /// The user's own message
    Message(String),
    /// A request to continue the previous reply
    Continue,
}

impl FinalTurn {
    /// Pick the final turn from a request's message and continue flag
    pub fn from_request(message: &str, continue_requested: bool) -> Self {
        if continue_requested {
            FinalTurn::Continue
        } else {
            FinalTurn::Message(message.to_string())
        }
    }
}

/// Cut `text` to at most `max_chars` characters.
///
/// Returns the text and whether it was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => (&text[..byte_index], true),
        None => (text, false),
    }
}

/// Builds the ordered turn list for one request
#[derive(Debug, Clone)]
pub struct TurnComposer<'a> {
    instructions: &'a str,
    budget: &'a Budget,
    history_window: usize,
    documents: &'a [SourceDocument],
    history: &'a [HistoryEntry],
}

impl<'a> TurnComposer<'a> {
    /// Create a composer for the given task instructions and budget
    pub fn new(instructions: &'a str, budget: &'a Budget, history_window: usize) -> Self {
        Self {
            instructions,
            budget,
            history_window,
            documents: &[],
            history: &[],
        }
    }

    /// Attach documents to inject into the system turn
    pub fn with_documents(mut self, documents: &'a [SourceDocument]) -> Self {
        self.documents = documents;
        self
    }

    /// Attach prior conversation history
    pub fn with_history(mut self, history: &'a [HistoryEntry]) -> Self {
        self.history = history;
        self
    }

    /// System turn content: instructions, marker rule, then documents
    pub fn system_prompt(&self) -> String {
        let mut prompt = String::with_capacity(self.instructions.len() + 256);
        prompt.push_str(self.instructions.trim());
        prompt.push_str("\n\nIf your answer does not fit in one reply, stop at a natural break and end the reply with ");
        prompt.push_str(CONTINUATION_MARKER);
        prompt.push_str(". Never use that marker otherwise.");

        if self.documents.is_empty() {
            return prompt;
        }

        let per_document = self.budget.per_document_chars(self.documents.len());
        prompt.push_str("\n\nReference documents:");
        for (index, document) in self.documents.iter().enumerate() {
            let name = if document.name.trim().is_empty() {
                format!("Document {}", index + 1)
            } else {
                document.name.trim().to_string()
            };
            let (content, truncated) = truncate_chars(document.content.trim(), per_document);

            prompt.push_str("\n\n### ");
            prompt.push_str(&name);
            prompt.push('\n');
            prompt.push_str(content);
            if truncated {
                prompt.push_str(TRUNCATION_ELLIPSIS);
            }
        }
        prompt
    }

    /// The most recent well-formed history turns, oldest first
    pub fn history_turns(&self) -> Vec<ConversationTurn> {
        let valid: Vec<ConversationTurn> = self.history.iter().filter_map(HistoryEntry::to_turn).collect();
        let start = valid.len().saturating_sub(self.history_window);
        valid.into_iter().skip(start).collect()
    }

    /// Assemble system turn, windowed history and the final turn
    pub fn compose(&self, final_turn: &FinalTurn) -> Vec<ConversationTurn> {
        let mut turns = Vec::with_capacity(self.history_window + 2);
        turns.push(ConversationTurn::system(self.system_prompt()));
        turns.extend(self.history_turns());

        let last = match final_turn {
            FinalTurn::Message(message) => {
                let (message, _) = truncate_chars(message.trim(), self.budget.message_chars());
                ConversationTurn::user(message)
            }
            FinalTurn::Continue => ConversationTurn::user(CONTINUE_DIRECTIVE),
        };
        turns.push(last);
        turns
    }
}
