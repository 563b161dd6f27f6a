//! Completion providers
//!
//! This module holds the completion-service abstraction, the
//! OpenAI-compatible client, provider error mapping and the retry policy.

pub mod adapter;
pub mod error;
pub mod openai;
pub mod retry;

pub use adapter::{CompletionService, ContentStream};
pub use error::{ProviderError, ProviderResult};
pub use retry::{RetryExecutor, RetryPolicy, RetryResult, Retryable};

// Re-export concrete providers
pub use openai::OpenAIProvider;
