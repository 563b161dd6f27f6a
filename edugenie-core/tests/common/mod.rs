//! Shared test doubles

#![allow(dead_code)]

use async_trait::async_trait;
use edugenie_core::protocol::{CompletionRequest, CompletionResult};
use edugenie_core::providers::{CompletionService, ContentStream, ProviderError, ProviderResult};
use futures::stream;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Route `tracing` output through the test harness; safe to call repeatedly
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("edugenie_core=debug")
        .with_test_writer()
        .try_init();
}

/// Replays scripted replies in order and records every request
pub struct ScriptedService {
    replies: Mutex<VecDeque<ProviderResult<CompletionResult>>>,
    /// Returned once the script runs out
    fallback: Option<CompletionResult>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedService {
    pub fn new(replies: Vec<ProviderResult<CompletionResult>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(replies: &[(&str, &str)]) -> Self {
        Self::new(
            replies
                .iter()
                .map(|(text, reason)| Ok(CompletionResult::new(*text, *reason)))
                .collect(),
        )
    }

    /// Answers every call with the same reply
    pub fn always(text: &str, finish_reason: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: Some(CompletionResult::new(text, finish_reason)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedService {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "test-model"
    }

    async fn complete(&self, request: CompletionRequest) -> ProviderResult<CompletionResult> {
        self.requests.lock().unwrap().push(request);
        let next = self.replies.lock().unwrap().pop_front();
        match (next, &self.fallback) {
            (Some(reply), _) => reply,
            (None, Some(fallback)) => Ok(fallback.clone()),
            (None, None) => Err(ProviderError::ServiceUnavailable("script exhausted".to_string())),
        }
    }

    async fn complete_stream(&self, request: CompletionRequest) -> ProviderResult<ContentStream> {
        let reply = self.complete(request).await?;
        let fragments: Vec<ProviderResult<String>> = reply
            .text
            .split_inclusive(' ')
            .map(|piece| Ok(piece.to_string()))
            .collect();
        Ok(Box::pin(stream::iter(fragments)))
    }
}
