//! OpenAI client implementation

use super::converter::{from_openai_response, to_openai_request};
use super::streaming::parse_stream;
use super::types::OpenAIResponse;
use crate::config::ProviderSettings;
use crate::protocol::{CompletionRequest, CompletionResult};
use crate::providers::error::map_http_error;
use crate::providers::{CompletionService, ContentStream, ProviderError, ProviderResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, ClientBuilder, Response};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default user agent
const USER_AGENT: &str = concat!("edugenie/", env!("CARGO_PKG_VERSION"));

/// OpenAI-compatible chat-completions provider
pub struct OpenAIProvider {
    settings: ProviderSettings,
    client: Client,
}

impl OpenAIProvider {
    /// Create a new provider with a pooled HTTP client
    pub fn new(settings: ProviderSettings) -> ProviderResult<Self> {
        let connection = &settings.connection;
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(connection.max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(connection.keepalive_secs))
            .connect_timeout(Duration::from_millis(connection.connect_timeout_ms))
            // Streamed bodies have no total bound, only an idle one
            .read_timeout(Duration::from_millis(connection.request_timeout_ms))
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
            .map_err(|e| ProviderError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { settings, client })
    }

    fn timeout_secs(&self) -> u64 {
        self.settings.connection.request_timeout_ms / 1000
    }

    /// Total deadline for a call; `None` for streamed replies
    fn call_timeout(&self, request: &CompletionRequest) -> Option<Duration> {
        (!request.stream).then(|| Duration::from_millis(self.settings.connection.request_timeout_ms))
    }

    /// Build request headers
    fn build_headers(&self, request_id: Uuid) -> ProviderResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        let bearer = format!("Bearer {}", self.settings.api_key.expose_secret());
        let mut auth = HeaderValue::from_str(&bearer)
            .map_err(|_| ProviderError::Configuration("API key contains invalid characters".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        if let Some(org_id) = &self.settings.organization_id {
            let value = HeaderValue::from_str(org_id)
                .map_err(|_| ProviderError::Configuration("Invalid organization id".to_string()))?;
            headers.insert("OpenAI-Organization", value);
        }

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        // Request ID header for correlation
        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            headers.insert("X-Request-ID", value);
        }

        Ok(headers)
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'))
    }

    /// Send the request and turn a non-success status into an error
    async fn send(&self, request: &CompletionRequest, request_id: Uuid) -> ProviderResult<Response> {
        let mut request = request.clone();
        if request.model.is_empty() {
            request.model = self.settings.model.clone();
        }
        let body = to_openai_request(&request);

        let url = self.endpoint();
        debug!("Request URL: {} [request_id: {}]", url, request_id);

        let mut builder = self
            .client
            .post(&url)
            .headers(self.build_headers(request_id)?)
            .json(&body);
        if let Some(timeout) = self.call_timeout(&request) {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| {
                warn!("Request error [request_id: {}]: {}", request_id, e);
                ProviderError::from_reqwest(e, self.timeout_secs())
            })?;

        let status = response.status();
        debug!("Response status: {} [request_id: {}]", status, request_id);

        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        warn!(
            "Request failed with status {} [request_id: {}]",
            status, request_id
        );
        Err(map_http_error(status, retry_after.as_deref(), &body))
    }
}

#[async_trait]
impl CompletionService for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.settings.model
    }

    async fn complete(&self, mut request: CompletionRequest) -> ProviderResult<CompletionResult> {
        let request_id = request.request_id.unwrap_or_else(Uuid::new_v4);
        request.stream = false;

        info!(
            "Completion request to {} with {} turns [request_id: {}]",
            self.name(),
            request.messages.len(),
            request_id
        );

        let response = self.send(&request, request_id).await?;
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout_secs()))?;
        let parsed: OpenAIResponse = serde_json::from_str(&text)?;

        if let Some(usage) = &parsed.usage {
            debug!(
                "Token usage: prompt={} completion={} total={} [request_id: {}]",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens, request_id
            );
        }

        let result = from_openai_response(parsed);
        info!(
            "Completion finished ({} chars, finish_reason={:?}) [request_id: {}]",
            result.text.len(),
            result.finish_reason,
            request_id
        );
        Ok(result)
    }

    async fn complete_stream(&self, mut request: CompletionRequest) -> ProviderResult<ContentStream> {
        let request_id = request.request_id.unwrap_or_else(Uuid::new_v4);
        request.stream = true;

        info!(
            "Streaming completion request to {} [request_id: {}]",
            self.name(),
            request_id
        );

        let response = self.send(&request, request_id).await?;
        Ok(parse_stream(response.bytes_stream()))
    }
}
