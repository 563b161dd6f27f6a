//! Completion service abstraction
//!
//! Every route talks to the LLM through [`CompletionService`], so tests and
//! alternative providers can be swapped in without touching the protocol.

use crate::protocol::{CompletionRequest, CompletionResult};
use crate::providers::error::ProviderResult;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Stream of content fragments from a streamed completion
pub type ContentStream = BoxStream<'static, ProviderResult<String>>;

/// Core trait that all completion providers implement
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Provider name, used in logs
    fn name(&self) -> &str;

    /// Model used when a caller does not pick one
    fn default_model(&self) -> &str;

    /// Issue one non-streaming completion call
    async fn complete(&self, request: CompletionRequest) -> ProviderResult<CompletionResult>;

    /// Issue one streaming completion call, yielding content fragments in order
    async fn complete_stream(&self, request: CompletionRequest) -> ProviderResult<ContentStream>;
}
