//! Email one-time passcodes

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub email: String,

    #[serde(default, alias = "code")]
    pub otp: String,
}

#[derive(Debug, Serialize)]
pub struct SendOtpResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpResponse {
    pub verified: bool,
}

pub async fn send_otp_handler(
    State(state): State<AppState>,
    payload: Result<Json<SendOtpRequest>, JsonRejection>,
) -> ApiResult<Json<SendOtpResponse>> {
    let Json(request) = payload?;
    state.otp.send(&request.email).await?;

    Ok(Json(SendOtpResponse {
        message: "OTP sent".to_string(),
    }))
}

pub async fn verify_otp_handler(
    State(state): State<AppState>,
    payload: Result<Json<VerifyOtpRequest>, JsonRejection>,
) -> ApiResult<Json<VerifyOtpResponse>> {
    let Json(request) = payload?;
    state.otp.verify(&request.email, &request.otp).await?;

    Ok(Json(VerifyOtpResponse { verified: true }))
}
