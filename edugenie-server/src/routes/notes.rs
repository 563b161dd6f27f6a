//! Streamed notes generation

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    Json,
};
use edugenie_core::continuation::truncate_chars;
use edugenie_core::protocol::{CompletionRequest, ConversationTurn};
use futures::StreamExt;
use serde::Deserialize;
use tracing::{info, warn};

use super::request_id;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const NOTES_INSTRUCTIONS: &str = "You are EduGenie, writing study notes for a student. \
Use Markdown headings, short bullet points, key definitions in bold, and finish with a brief summary.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesRequest {
    #[serde(default)]
    pub topic: String,

    /// Source material to base the notes on
    #[serde(default)]
    pub content: Option<String>,

    /// e.g. "concise", "detailed", "exam revision"
    #[serde(default)]
    pub style: Option<String>,
}

fn notes_prompt(request: &NotesRequest, max_content_chars: usize) -> String {
    let mut prompt = format!("Write study notes on: {}.", request.topic.trim());

    if let Some(style) = request.style.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        prompt.push_str(&format!("\nStyle: {}.", style));
    }

    if let Some(content) = request.content.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        let (content, truncated) = truncate_chars(content, max_content_chars);
        prompt.push_str("\n\nBase the notes on this material:\n");
        prompt.push_str(content);
        if truncated {
            prompt.push_str("...");
        }
    }

    prompt
}

pub async fn generate_notes_handler(
    State(state): State<AppState>,
    payload: Result<Json<NotesRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload?;
    if request.topic.trim().is_empty() {
        return Err(ApiError::validation("topic is required"));
    }

    let id = request_id();
    info!("generate-notes request on '{}' [request_id: {}]", request.topic.trim(), id);

    // Source material gets the same allowance as a single chat document
    let max_content_chars = state.config.profiles.general_chat.budget.per_document_chars(1);
    let settings = &state.config.notes;

    let completion = CompletionRequest::new(
        state.service.default_model(),
        vec![
            ConversationTurn::system(NOTES_INSTRUCTIONS),
            ConversationTurn::user(notes_prompt(&request, max_content_chars)),
        ],
    )
    .with_temperature(settings.temperature)
    .with_max_tokens(settings.max_output_tokens)
    .with_streaming()
    .with_request_id(Some(id));

    let stream = state.service.complete_stream(completion).await?;
    let stream = stream.map(move |fragment| {
        if let Err(e) = &fragment {
            warn!("Notes stream ended early: {} [request_id: {}]", e, id);
        }
        fragment
    });

    Ok((
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(stream),
    )
        .into_response())
}
