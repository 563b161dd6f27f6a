//! Chunked completion reassembly
//!
//! Chat-style replies can be longer than one completion call may produce.
//! The pieces here work together for one request:
//! - [`Budget`] turns token ceilings into character allowances
//! - [`TurnComposer`] builds the system turn, windowed history and final turn
//! - [`needs_continuation`] decides whether a reply was cut off
//! - [`ChunkStitcher`] keeps calling until the reply is complete or the
//!   chunk ceiling is reached
//!
//! Nothing here outlives the request it serves.

pub mod budget;
pub mod detector;
pub mod stitcher;
pub mod turns;

pub use budget::{Budget, APPROX_CHARS_PER_TOKEN};
pub use detector::{ends_with_marker, needs_continuation, strip_marker, CONTINUATION_MARKER};
pub use stitcher::{invoke, ChunkAccumulator, ChunkStitcher, StitchOutcome, StitchState};
pub use turns::{
    truncate_chars, FinalTurn, HistoryEntry, SourceDocument, TurnComposer, CONTINUE_DIRECTIVE,
    CONTINUE_TURN,
};

use crate::config::ValidationError;
use crate::providers::ProviderError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the continuation protocol
#[derive(Debug, Error)]
pub enum ContinuationError {
    /// The completion service failed
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The model produced no text
    #[error("empty response from model")]
    EmptyResponse,
}

/// Per-route constants for the continuation protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatProfile {
    /// Token and chunk ceilings
    pub budget: Budget,

    /// Most recent history turns to keep
    pub history_window: usize,

    /// Sampling temperature
    pub temperature: f32,

    /// Nucleus sampling parameter
    #[serde(default)]
    pub top_p: Option<f32>,
}

impl ChatProfile {
    /// General study chat
    pub fn general_chat() -> Self {
        Self {
            budget: Budget::new(1500, 6000, 3),
            history_window: 6,
            temperature: 0.7,
            top_p: None,
        }
    }

    /// Questions answered from attached PDF text
    pub fn pdf_chat() -> Self {
        Self {
            budget: Budget::new(2000, 7000, 2),
            history_window: 6,
            temperature: 0.3,
            top_p: None,
        }
    }

    /// Step-by-step tutoring
    pub fn tutor() -> Self {
        Self {
            budget: Budget::new(1200, 4000, 2),
            history_window: 2,
            temperature: 0.6,
            top_p: Some(0.9),
        }
    }

    /// Validate profile values
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        self.budget.validate(&format!("{}.budget", path))?;

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::out_of_range(
                format!("{}.temperature", path),
                "Must be between 0.0 and 2.0",
            ));
        }

        if let Some(top_p) = self.top_p {
            if !(top_p > 0.0 && top_p <= 1.0) {
                return Err(ValidationError::out_of_range(
                    format!("{}.top_p", path),
                    "Must be in (0.0, 1.0]",
                ));
            }
        }

        Ok(())
    }
}
