use axum::{extract::rejection::JsonRejection, extract::State, Json};
use edugenie_core::schedule::{ScheduleGenerator, ScheduleRequest, StudyEvent};
use serde::Serialize;
use tracing::info;

use super::request_id;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub events: Vec<StudyEvent>,
}

pub async fn generate_schedule_handler(
    State(state): State<AppState>,
    payload: Result<Json<ScheduleRequest>, JsonRejection>,
) -> ApiResult<Json<ScheduleResponse>> {
    let Json(request) = payload?;

    let id = request_id();
    info!(
        "generate-schedule request: {} subject(s), {} to {} [request_id: {}]",
        request.subjects.len(),
        request.start_date,
        request.end_date,
        id
    );

    let events = ScheduleGenerator::new(state.service.as_ref(), &state.config.schedule)
        .with_request_id(id)
        .generate(&request)
        .await?;

    info!("generate-schedule produced {} event(s) [request_id: {}]", events.len(), id);
    Ok(Json(ScheduleResponse { events }))
}
