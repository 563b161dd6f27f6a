//! Core protocol types for completion calls
//!
//! These are the provider-agnostic shapes the continuation protocol, the quiz
//! generator and the schedule planner exchange with a completion service.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Finish reason a provider reports when the output budget ran out
pub const FINISH_REASON_LENGTH: &str = "length";

/// Finish reason for a reply that ended naturally
pub const FINISH_REASON_STOP: &str = "stop";

/// Role of a turn in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Task instructions and injected documents
    System,
    /// End-user input
    User,
    /// Model output
    Assistant,
}

impl Role {
    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Parse a role name as front-ends send it.
    ///
    /// Chat widgets label model turns inconsistently, so `ai`, `bot` and
    /// `model` are accepted as assistant turns.
    pub fn parse_lenient(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "system" => Some(Role::System),
            "user" | "human" => Some(Role::User),
            "assistant" | "ai" | "bot" | "model" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// One turn of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Who produced the turn
    pub role: Role,

    /// Text of the turn
    pub content: String,
}

impl ConversationTurn {
    /// Create a turn with an explicit role
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system turn
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A request to the completion service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CompletionRequest {
    /// Model identifier
    #[serde(default)]
    pub model: String,

    /// Ordered turns
    #[serde(default)]
    pub messages: Vec<ConversationTurn>,

    /// Sampling temperature (0.0 to 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Output token ceiling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Nucleus sampling parameter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Whether the reply should be streamed
    #[serde(default)]
    pub stream: bool,

    /// Correlation id sent to the provider; one is generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
}

impl CompletionRequest {
    /// Create a request for a model and a list of turns
    pub fn new(model: impl Into<String>, messages: Vec<ConversationTurn>) -> Self {
        Self {
            model: model.into(),
            messages,
            ..Default::default()
        }
    }

    /// Set the temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the output token ceiling
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set top_p
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Request a streamed reply
    pub fn with_streaming(mut self) -> Self {
        self.stream = true;
        self
    }

    pub fn with_request_id(mut self, request_id: Option<Uuid>) -> Self {
        self.request_id = request_id;
        self
    }
}

/// Text and finish indicator of one completion call
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompletionResult {
    /// Reply text, empty when the provider sent none
    pub text: String,

    /// Provider finish reason, empty when the provider sent none
    pub finish_reason: String,
}

impl CompletionResult {
    /// Create a result from text and a finish reason
    pub fn new(text: impl Into<String>, finish_reason: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            finish_reason: finish_reason.into(),
        }
    }

    /// Whether the provider cut the reply off at the output budget
    pub fn is_length_truncated(&self) -> bool {
        self.finish_reason == FINISH_REASON_LENGTH
    }

    /// Whether the reply carries no text at all
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}
