//! Quiz generation and adaptive analysis
//!
//! A quiz is generated as structured JSON by the model, normalized from
//! whatever shape the model chose, scored locally, and the analysis is fed
//! back into the next generation as context.

pub mod analysis;
pub mod generate;
pub mod normalize;

pub use analysis::{analyze, MissedQuestion, QuizAnalysis, QuizSubmission, SubmittedAnswer, TopicScore};
pub use generate::{QuizGenerator, QuizSettings};
pub use normalize::normalize_questions;

use crate::providers::{ProviderError, Retryable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest quiz a single request may ask for
pub const MAX_QUESTIONS: u32 = 20;

/// Errors from quiz generation and scoring
#[derive(Debug, Error)]
pub enum QuizError {
    /// The request itself is unusable
    #[error("{0}")]
    Validation(String),

    /// The completion service failed
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The model's reply held no usable questions
    #[error("model returned malformed quiz: {0}")]
    MalformedOutput(String),
}

impl Retryable for QuizError {
    fn is_retryable(&self) -> bool {
        match self {
            QuizError::Provider(error) => error.is_retryable(),
            QuizError::MalformedOutput(_) => true,
            QuizError::Validation(_) => false,
        }
    }

    fn retry_after(&self) -> Option<std::time::Duration> {
        match self {
            QuizError::Provider(error) => error.retry_delay(),
            _ => None,
        }
    }
}

/// Question difficulty
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

fn default_num_questions() -> u32 {
    5
}

/// A request for a new quiz
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRequest {
    /// Subject of the quiz
    #[serde(default)]
    pub topic: String,

    /// How many questions to ask for
    #[serde(default = "default_num_questions", alias = "count")]
    pub num_questions: u32,

    #[serde(default)]
    pub difficulty: Difficulty,

    /// Analysis of the previous attempt, used to target weak areas
    #[serde(default)]
    pub previous_results: Option<QuizAnalysis>,
}

impl QuizRequest {
    pub fn new(topic: impl Into<String>, num_questions: u32) -> Self {
        Self {
            topic: topic.into(),
            num_questions,
            difficulty: Difficulty::default(),
            previous_results: None,
        }
    }

    /// Check the request before any provider call
    pub fn validate(&self) -> Result<(), QuizError> {
        if self.topic.trim().is_empty() {
            return Err(QuizError::Validation("topic is required".to_string()));
        }
        if self.num_questions == 0 || self.num_questions > MAX_QUESTIONS {
            return Err(QuizError::Validation(format!(
                "numQuestions must be between 1 and {}",
                MAX_QUESTIONS
            )));
        }
        Ok(())
    }
}

/// A normalized multiple-choice question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    /// Position in the quiz, starting at 1
    pub id: usize,

    pub question: String,

    pub options: Vec<String>,

    /// Index of the correct option
    pub answer_index: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

impl QuizQuestion {
    /// Text of the correct option
    pub fn correct_option(&self) -> &str {
        self.options
            .get(self.answer_index)
            .map(String::as_str)
            .unwrap_or_default()
    }
}
