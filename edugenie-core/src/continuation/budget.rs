//! Input/output budgets for one request type
//!
//! Character allowances are derived from token ceilings with a fixed
//! chars-per-token ratio. This is an approximation, not a tokenizer.

use crate::config::ValidationError;
use serde::{Deserialize, Serialize};

/// Approximate characters per token
pub const APPROX_CHARS_PER_TOKEN: usize = 4;

/// Default share of the input allowance given to attached documents
pub const DEFAULT_DOCUMENT_FRACTION: f64 = 0.55;

/// Default share of the input allowance given to the user's message
pub const DEFAULT_MESSAGE_FRACTION: f64 = 0.25;

/// Token and chunk ceilings for one request type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Budget {
    /// Output token ceiling per completion call
    pub max_output_tokens: u32,

    /// Input token ceiling for the composed turns
    pub max_input_tokens: usize,

    /// Characters assumed per token
    #[serde(default = "default_chars_per_token")]
    pub approx_chars_per_token: usize,

    /// Maximum completion calls for one reply
    pub max_chunks: u32,

    /// Share of the input allowance split across documents
    #[serde(default = "default_document_fraction")]
    pub document_fraction: f64,

    /// Share of the input allowance for the user's message
    #[serde(default = "default_message_fraction")]
    pub message_fraction: f64,
}

fn default_chars_per_token() -> usize {
    APPROX_CHARS_PER_TOKEN
}
fn default_document_fraction() -> f64 {
    DEFAULT_DOCUMENT_FRACTION
}
fn default_message_fraction() -> f64 {
    DEFAULT_MESSAGE_FRACTION
}

impl Budget {
    /// Create a budget with the default ratio and fractions
    pub fn new(max_output_tokens: u32, max_input_tokens: usize, max_chunks: u32) -> Self {
        Self {
            max_output_tokens,
            max_input_tokens,
            approx_chars_per_token: APPROX_CHARS_PER_TOKEN,
            max_chunks,
            document_fraction: DEFAULT_DOCUMENT_FRACTION,
            message_fraction: DEFAULT_MESSAGE_FRACTION,
        }
    }

    /// Character ceiling for the combined input
    pub fn max_input_chars(&self) -> usize {
        self.max_input_tokens.saturating_mul(self.approx_chars_per_token)
    }

    /// Character allowance for each of `document_count` documents
    pub fn per_document_chars(&self, document_count: usize) -> usize {
        let divisor = document_count.max(1) as f64;
        (self.max_input_chars() as f64 * self.document_fraction / divisor).floor() as usize
    }

    /// Character allowance for the user's own message
    pub fn message_chars(&self) -> usize {
        (self.max_input_chars() as f64 * self.message_fraction).floor() as usize
    }

    /// Chunk ceiling, never below one call
    pub fn chunk_limit(&self) -> u32 {
        self.max_chunks.max(1)
    }

    /// Validate budget values
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.max_output_tokens == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.max_output_tokens", path),
                "Must be greater than 0",
            ));
        }

        if self.max_input_tokens == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.max_input_tokens", path),
                "Must be greater than 0",
            ));
        }

        if self.approx_chars_per_token == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.approx_chars_per_token", path),
                "Must be greater than 0",
            ));
        }

        if self.max_chunks == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.max_chunks", path),
                "Must be at least 1",
            ));
        }

        for (field, value) in [
            ("document_fraction", self.document_fraction),
            ("message_fraction", self.message_fraction),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ValidationError::out_of_range(
                    format!("{}.{}", path, field),
                    "Must be in (0.0, 1.0]",
                ));
            }
        }

        Ok(())
    }
}
