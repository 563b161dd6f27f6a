//! Router harness and test doubles

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use edugenie_core::config::{EduGenieConfig, ProviderSettings};
use edugenie_core::otp::{CodeDelivery, MemoryOtpStore, OtpError, OtpService};
use edugenie_core::protocol::{CompletionRequest, CompletionResult};
use edugenie_core::providers::{CompletionService, ContentStream, ProviderError, ProviderResult};
use edugenie_server::{router, AppState};
use futures::stream;
use serde_json::Value;
use tower::ServiceExt;

/// Replays scripted replies in order and records every request
pub struct ScriptedService {
    replies: Mutex<VecDeque<ProviderResult<CompletionResult>>>,
    fallback: Option<CompletionResult>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedService {
    pub fn new(replies: Vec<ProviderResult<CompletionResult>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(replies: &[(&str, &str)]) -> Arc<Self> {
        Self::new(
            replies
                .iter()
                .map(|(text, reason)| Ok(CompletionResult::new(*text, *reason)))
                .collect(),
        )
    }

    pub fn always(text: &str, finish_reason: &str) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: Some(CompletionResult::new(text, finish_reason)),
            requests: Mutex::new(Vec::new()),
        })
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

/// Keeps the last delivered code instead of sending it
#[derive(Default)]
pub struct CapturedDelivery {
    last: Mutex<Option<(String, String)>>,
}

impl CapturedDelivery {
    pub fn last_code(&self) -> Option<String> {
        self.last.lock().unwrap().as_ref().map(|(_, code)| code.clone())
    }

    pub fn last_email(&self) -> Option<String> {
        self.last.lock().unwrap().as_ref().map(|(email, _)| email.clone())
    }
}

#[async_trait]
impl CodeDelivery for CapturedDelivery {
    async fn deliver(&self, email: &str, code: &str, _ttl: Duration) -> Result<(), OtpError> {
        *self.last.lock().unwrap() = Some((email.to_string(), code.to_string()));
        Ok(())
    }
}

pub fn config() -> EduGenieConfig {
    EduGenieConfig::with_provider(ProviderSettings::new("sk-test"))
}

pub fn app(service: Arc<ScriptedService>) -> Router {
    router(AppState::new(service, config()))
}

pub fn app_with_delivery(service: Arc<ScriptedService>, delivery: Arc<CapturedDelivery>) -> Router {
    let config = config();
    let otp = OtpService::new(
        Arc::new(MemoryOtpStore::new(&config.otp)),
        delivery,
        config.otp.ttl(),
    );
    router(AppState::with_otp(service, config, otp))
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = ServiceExt::<Request<Body>>::oneshot(app, request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 100_000).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

pub async fn post_raw(app: Router, uri: &str, body: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let (status, text) = post_raw(app, uri, &body.to_string()).await;
    (status, serde_json::from_str(&text).unwrap())
}
