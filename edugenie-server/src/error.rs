use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use edugenie_core::continuation::ContinuationError;
use edugenie_core::otp::OtpError;
use edugenie_core::providers::ProviderError;
use edugenie_core::quiz::QuizError;
use edugenie_core::schedule::ScheduleError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Every handler failure, rendered as `{ "error": message }`
#[derive(Error, Debug)]
pub enum ApiError {
    /// Rejected before any provider call
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Provider(#[from] ProviderError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Provider(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<ContinuationError> for ApiError {
    fn from(error: ContinuationError) -> Self {
        match error {
            ContinuationError::Provider(e) => ApiError::Provider(e),
            ContinuationError::EmptyResponse => ApiError::Internal(error.to_string()),
        }
    }
}

impl From<QuizError> for ApiError {
    fn from(error: QuizError) -> Self {
        match error {
            QuizError::Validation(message) => ApiError::Validation(message),
            QuizError::Provider(e) => ApiError::Provider(e),
            QuizError::MalformedOutput(_) => ApiError::Internal(error.to_string()),
        }
    }
}

impl From<ScheduleError> for ApiError {
    fn from(error: ScheduleError) -> Self {
        match error {
            ScheduleError::Validation(message) => ApiError::Validation(message),
            ScheduleError::Provider(e) => ApiError::Provider(e),
            ScheduleError::MalformedOutput(_) => ApiError::Internal(error.to_string()),
        }
    }
}

impl From<OtpError> for ApiError {
    fn from(error: OtpError) -> Self {
        match error {
            OtpError::InvalidEmail | OtpError::InvalidCode => ApiError::Validation(error.to_string()),
            OtpError::Delivery(_) => ApiError::Internal(error.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::validation("bad").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(ContinuationError::EmptyResponse).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(QuizError::Validation("topic is required".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::from(OtpError::InvalidCode).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(ProviderError::Timeout(60)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages_pass_through() {
        assert_eq!(
            ApiError::from(ContinuationError::EmptyResponse).to_string(),
            "empty response from model"
        );
        assert_eq!(
            ApiError::from(ProviderError::Authentication("Incorrect API key".into())).to_string(),
            "Authentication failed: Incorrect API key"
        );
    }
}
