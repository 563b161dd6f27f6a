//! EduGenie Core Library
//!
//! Provider client, chunked completion reassembly and the study tools
//! (quizzes, schedules, one-time codes) behind the EduGenie server.

pub mod config;
pub mod continuation;
pub mod extract;
pub mod otp;
pub mod protocol;
pub mod providers;
pub mod quiz;
pub mod schedule;

pub use continuation::{ChatProfile, ChunkStitcher, ContinuationError, StitchOutcome};
pub use protocol::{CompletionRequest, CompletionResult, ConversationTurn, Role};
pub use providers::{CompletionService, OpenAIProvider, ProviderError, ProviderResult};

/// Returns the version of the EduGenie Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }
}
