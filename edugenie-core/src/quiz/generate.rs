//! Quiz generation with retry

use super::{normalize_questions, QuizError, QuizQuestion, QuizRequest};
use crate::config::ValidationError;
use crate::extract::extract_json;
use crate::protocol::{CompletionRequest, ConversationTurn};
use crate::providers::{CompletionService, RetryExecutor, RetryPolicy};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// Previously missed questions included in the adaptive prompt
const MAX_MISSED_IN_PROMPT: usize = 10;

const QUIZ_INSTRUCTIONS: &str = "You are an experienced teacher who writes multiple-choice quizzes. \
Reply with JSON only, no prose and no markdown. The JSON must be an object of the form \
{\"questions\": [{\"question\": string, \"options\": [4 strings], \"answer\": string (the exact text of the correct option), \
\"explanation\": string, \"topic\": string (the sub-topic tested)}]}.";

fn default_max_output_tokens() -> u32 {
    2000
}

fn default_temperature() -> f32 {
    0.5
}

/// Settings for quiz generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuizSettings {
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
            retry: RetryPolicy::quiz_generation(),
        }
    }
}

impl QuizSettings {
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.max_output_tokens == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.max_output_tokens", path),
                "Must be greater than 0",
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::out_of_range(
                format!("{}.temperature", path),
                "Must be between 0.0 and 2.0",
            ));
        }
        Ok(())
    }
}

/// Build the user turn for a quiz request
pub fn quiz_prompt(request: &QuizRequest) -> String {
    let mut prompt = format!(
        "Create {} {} multiple-choice questions about: {}.",
        request.num_questions,
        request.difficulty.as_str(),
        request.topic.trim()
    );

    if let Some(previous) = &request.previous_results {
        prompt.push_str("\n\n");
        prompt.push_str(&previous.summary(MAX_MISSED_IN_PROMPT));
        prompt.push_str(
            "\nFocus at least half of the new questions on the weak topics and the concepts behind \
the missed questions, without repeating those questions verbatim.",
        );
    }

    prompt
}

/// Generates quizzes through a completion service
pub struct QuizGenerator<'a> {
    service: &'a dyn CompletionService,
    settings: &'a QuizSettings,
    request_id: Option<Uuid>,
}

impl<'a> QuizGenerator<'a> {
    pub fn new(service: &'a dyn CompletionService, settings: &'a QuizSettings) -> Self {
        Self {
            service,
            settings,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = Some(request_id);
        self
    }

    async fn attempt(&self, turns: &[ConversationTurn]) -> Result<Vec<QuizQuestion>, QuizError> {
        let request = CompletionRequest::new(self.service.default_model(), turns.to_vec())
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_output_tokens)
            .with_request_id(self.request_id);

        let result = self.service.complete(request).await?;
        let value = extract_json(&result.text)
            .into_result()
            .map_err(QuizError::MalformedOutput)?;

        let questions = normalize_questions(&value);
        if questions.is_empty() {
            return Err(QuizError::MalformedOutput(
                "no usable questions in model output".to_string(),
            ));
        }
        Ok(questions)
    }

    /// Generate a quiz, retrying transient failures and malformed output
    pub async fn generate(&self, request: &QuizRequest) -> Result<Vec<QuizQuestion>, QuizError> {
        request.validate()?;

        let turns = vec![
            ConversationTurn::system(QUIZ_INSTRUCTIONS),
            ConversationTurn::user(quiz_prompt(request)),
        ];

        let turns = &turns;
        let executor = RetryExecutor::new(self.settings.retry.clone());
        let result = executor.execute(move || self.attempt(turns)).await;
        debug!(
            "Quiz generation finished after {} retries ({} ms backoff)",
            result.retries, result.total_delay_ms
        );

        let mut questions = result.into_result()?;
        questions.truncate(request.num_questions as usize);
        info!(
            "Generated {} question(s) on '{}'",
            questions.len(),
            request.topic.trim()
        );
        Ok(questions)
    }
}
