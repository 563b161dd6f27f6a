//! Quiz generation and adaptive analysis

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use edugenie_core::quiz::{analyze, QuizAnalysis, QuizGenerator, QuizQuestion, QuizRequest, QuizSubmission};
use serde::Serialize;
use tracing::info;

use super::request_id;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub questions: Vec<QuizQuestion>,
}

pub async fn generate_quiz_handler(
    State(state): State<AppState>,
    payload: Result<Json<QuizRequest>, JsonRejection>,
) -> ApiResult<Json<QuizResponse>> {
    let Json(request) = payload?;

    let id = request_id();
    info!(
        "generate-quiz request: {} {} question(s) on '{}', adaptive={} [request_id: {}]",
        request.num_questions,
        request.difficulty.as_str(),
        request.topic.trim(),
        request.previous_results.is_some(),
        id
    );

    let questions = QuizGenerator::new(state.service.as_ref(), &state.config.quiz)
        .with_request_id(id)
        .generate(&request)
        .await?;

    info!("generate-quiz produced {} question(s) [request_id: {}]", questions.len(), id);
    Ok(Json(QuizResponse { questions }))
}

pub async fn analyze_quiz_handler(
    payload: Result<Json<QuizSubmission>, JsonRejection>,
) -> ApiResult<Json<QuizAnalysis>> {
    let Json(submission) = payload?;
    let analysis = analyze(&submission)?;
    Ok(Json(analysis))
}
