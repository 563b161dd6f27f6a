//! Chat routes backed by chunked completion reassembly

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use edugenie_core::continuation::{
    ChatProfile, ChunkStitcher, FinalTurn, HistoryEntry, SourceDocument, TurnComposer,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::request_id;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const GENERAL_INSTRUCTIONS: &str = "You are EduGenie, a friendly study assistant. \
Explain concepts clearly, use examples, and format answers in Markdown.";

const PDF_INSTRUCTIONS: &str = "You are EduGenie, a study assistant answering questions about the \
student's documents. Answer from the reference documents below. If they do not contain the answer, \
say so before drawing on general knowledge.";

const TUTOR_INSTRUCTIONS: &str = "You are EduGenie, a patient tutor. Guide the student step by step, \
ask a short check-for-understanding question when useful, and never just hand over final answers \
to homework problems.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub history: Vec<HistoryEntry>,

    #[serde(default, rename = "continue")]
    pub continue_requested: bool,

    #[serde(default)]
    pub documents: Vec<SourceDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPdfRequest {
    #[serde(default)]
    pub question: String,

    #[serde(default)]
    pub documents: Vec<SourceDocument>,

    #[serde(default)]
    pub history: Vec<HistoryEntry>,

    #[serde(default, rename = "continue")]
    pub continue_requested: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorRequest {
    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub subject: Option<String>,

    #[serde(default)]
    pub history: Vec<HistoryEntry>,

    #[serde(default, rename = "continue")]
    pub continue_requested: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub has_more: bool,
}

/// Shared path for all chat routes
struct ChatTurn<'a> {
    route: &'static str,
    instructions: &'a str,
    profile: &'a ChatProfile,
    message: &'a str,
    continue_requested: bool,
    history: &'a [HistoryEntry],
    documents: &'a [SourceDocument],
}

impl ChatTurn<'_> {
    async fn run(self, state: &AppState) -> ApiResult<Json<ChatResponse>> {
        let final_turn = FinalTurn::from_request(self.message, self.continue_requested);
        if matches!(&final_turn, FinalTurn::Message(m) if m.trim().is_empty()) {
            return Err(ApiError::validation("message is required"));
        }

        let id = request_id();
        info!(
            "{} request: {} history entries, {} documents, continue={} [request_id: {}]",
            self.route,
            self.history.len(),
            self.documents.len(),
            self.continue_requested,
            id
        );

        let turns = TurnComposer::new(self.instructions, &self.profile.budget, self.profile.history_window)
            .with_documents(self.documents)
            .with_history(self.history)
            .compose(&final_turn);

        let outcome = ChunkStitcher::new(state.service.as_ref(), self.profile)
            .with_request_id(id)
            .run(turns)
            .await?;

        info!(
            "{} reply: {} chars in {} chunk(s), has_more={} [request_id: {}]",
            self.route,
            outcome.text.len(),
            outcome.chunk_count,
            outcome.has_more,
            id
        );

        Ok(Json(ChatResponse {
            response: outcome.text,
            has_more: outcome.has_more,
        }))
    }
}

pub async fn generate_handler(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let Json(request) = payload?;

    ChatTurn {
        route: "generate",
        instructions: GENERAL_INSTRUCTIONS,
        profile: &state.config.profiles.general_chat,
        message: &request.message,
        continue_requested: request.continue_requested,
        history: &request.history,
        documents: &request.documents,
    }
    .run(&state)
    .await
}

pub async fn chat_pdf_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatPdfRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let Json(request) = payload?;

    if request.documents.iter().all(|d| d.content.trim().is_empty()) {
        return Err(ApiError::validation("at least one document with content is required"));
    }

    ChatTurn {
        route: "chat-pdf",
        instructions: PDF_INSTRUCTIONS,
        profile: &state.config.profiles.pdf_chat,
        message: &request.question,
        continue_requested: request.continue_requested,
        history: &request.history,
        documents: &request.documents,
    }
    .run(&state)
    .await
}

pub async fn tutor_handler(
    State(state): State<AppState>,
    payload: Result<Json<TutorRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let Json(request) = payload?;

    let instructions = match request.subject.as_deref().map(str::trim) {
        Some(subject) if !subject.is_empty() => {
            format!("{}\n\nThe subject is {}.", TUTOR_INSTRUCTIONS, subject)
        }
        _ => TUTOR_INSTRUCTIONS.to_string(),
    };

    ChatTurn {
        route: "tutor",
        instructions: &instructions,
        profile: &state.config.profiles.tutor,
        message: &request.message,
        continue_requested: request.continue_requested,
        history: &request.history,
        documents: &[],
    }
    .run(&state)
    .await
}
