//! Provider error types and handling

use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur when talking to the completion service
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Network or connection error
    #[error("Network error: {0}")]
    Network(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        retry_after_secs: Option<u64>,
    },

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Provider returned an error we have no better mapping for
    #[error("Provider error: {code}: {message}")]
    ProviderError { code: String, message: String },

    /// Timeout occurred
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Response parsing error
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Model not found
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Insufficient quota
    #[error("Insufficient quota: {0}")]
    InsufficientQuota(String),

    /// Service unavailable
    #[error("Service temporarily unavailable: {0}")]
    ServiceUnavailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ProviderError {
    /// Whether repeating the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimit { .. } | Self::Timeout(_) | Self::ServiceUnavailable(_) | Self::Network(_)
        )
    }

    /// Delay the provider asked for, if any
    pub fn retry_delay(&self) -> Option<Duration> {
        match self {
            Self::RateLimit {
                retry_after_secs: Some(secs),
                ..
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }

    /// Build an error from a reqwest failure, given the configured timeout
    pub fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(timeout_secs)
        } else if err.is_connect() {
            ProviderError::Network(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            ProviderError::ParseError(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::ParseError(err.to_string())
    }
}

/// Map a non-success HTTP status and body to a provider error
///
/// OpenAI-style bodies (`{"error": {"message", "type", "code"}}`) are mapped
/// by error type first; anything else falls back to the status code.
pub fn map_http_error(status: StatusCode, retry_after: Option<&str>, body: &str) -> ProviderError {
    let retry_after_secs = retry_after.and_then(parse_retry_after).map(|d| d.as_secs());
    let details = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| extract_error_details(&json));

    if let Some((message, error_type)) = details {
        let by_type = match error_type.as_deref() {
            Some("invalid_api_key") | Some("authentication_error") => {
                Some(ProviderError::Authentication(message.clone()))
            }
            Some("rate_limit_exceeded") | Some("rate_limit_error") => Some(ProviderError::RateLimit {
                message: message.clone(),
                retry_after_secs,
            }),
            Some("insufficient_quota") => Some(ProviderError::InsufficientQuota(message.clone())),
            Some("model_not_found") => Some(ProviderError::ModelNotFound(message.clone())),
            _ => None,
        };
        if let Some(error) = by_type {
            return error;
        }
        return map_status(status, message, retry_after_secs);
    }

    let message = if body.trim().is_empty() {
        format!("HTTP error {}", status.as_u16())
    } else {
        body.to_string()
    };
    map_status(status, message, retry_after_secs)
}

fn map_status(status: StatusCode, message: String, retry_after_secs: Option<u64>) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Authentication(message),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimit {
            message,
            retry_after_secs,
        },
        StatusCode::NOT_FOUND => ProviderError::ModelNotFound(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ProviderError::Timeout(0),
        status if status.is_server_error() => ProviderError::ServiceUnavailable(message),
        status if status.is_client_error() => ProviderError::InvalidRequest(message),
        _ => ProviderError::ProviderError {
            code: status.as_u16().to_string(),
            message,
        },
    }
}

/// Pull `(message, type)` out of common error body formats
fn extract_error_details(json: &Value) -> Option<(String, Option<String>)> {
    // OpenAI format: { "error": { "message": "...", "type": "...", "code": "..." } }
    if let Some(error) = json.get("error") {
        if let Some(message) = error.get("message").and_then(|v| v.as_str()) {
            let error_type = error
                .get("code")
                .and_then(|v| v.as_str())
                .or_else(|| error.get("type").and_then(|v| v.as_str()))
                .map(str::to_string);
            return Some((message.to_string(), error_type));
        }
        if let Some(message) = error.as_str() {
            return Some((message.to_string(), None));
        }
    }

    json.get("message")
        .and_then(|v| v.as_str())
        .map(|message| (message.to_string(), None))
}

/// Parse a Retry-After header value given in seconds
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    header_value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_error_body_mapping() {
        let body = r#"{"error":{"message":"slow down","type":"requests","code":"rate_limit_exceeded"}}"#;
        let error = map_http_error(StatusCode::TOO_MANY_REQUESTS, Some("7"), body);
        match error {
            ProviderError::RateLimit {
                message,
                retry_after_secs,
            } => {
                assert_eq!(message, "slow down");
                assert_eq!(retry_after_secs, Some(7));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_status_fallback() {
        assert!(matches!(
            map_http_error(StatusCode::BAD_GATEWAY, None, "upstream died"),
            ProviderError::ServiceUnavailable(msg) if msg == "upstream died"
        ));
        assert!(matches!(
            map_http_error(StatusCode::UNAUTHORIZED, None, ""),
            ProviderError::Authentication(_)
        ));
        assert!(matches!(
            map_http_error(StatusCode::BAD_REQUEST, None, r#"{"error":{"message":"bad","type":"invalid_request_error"}}"#),
            ProviderError::InvalidRequest(msg) if msg == "bad"
        ));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderError::Timeout(30).is_retryable());
        assert!(ProviderError::ServiceUnavailable("x".into()).is_retryable());
        assert!(!ProviderError::Authentication("x".into()).is_retryable());
        assert!(!ProviderError::InvalidRequest("x".into()).is_retryable());
    }

    #[test]
    fn test_retry_after_parsing() {
        assert_eq!(parse_retry_after("5"), Some(Duration::from_secs(5)));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }
}
