//! EduGenie HTTP API
//!
//! Thin axum layer over `edugenie-core`: every handler validates its JSON body,
//! delegates to the core crate and renders failures as `{ "error": message }`.
//!
//! | Route                     | Handler                              |
//! |---------------------------|--------------------------------------|
//! | `POST /api/generate`      | general chat with continuation       |
//! | `POST /api/chat-pdf`      | document-grounded chat               |
//! | `POST /api/tutor`         | tutoring chat                        |
//! | `POST /api/generate-notes`| streamed Markdown notes              |
//! | `POST /api/quiz`          | quiz generation                      |
//! | `POST /api/quiz/analyze`  | quiz scoring and weak-topic analysis |
//! | `POST /api/schedule`      | study schedule planning              |
//! | `POST /api/send-otp`      | issue a one-time passcode            |
//! | `POST /api/verify-otp`    | check a one-time passcode            |
//! | `GET  /health`            | liveness                             |

use std::time::Duration;

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub mod error;
pub mod routes;
pub mod state;

use routes::{chat, health, notes, otp, quiz, schedule};
pub use state::AppState;

/// Any origin when none are configured
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring unusable CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(origins))
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.allowed_origins);

    Router::new()
        .route("/api/generate", post(chat::generate_handler))
        .route("/api/chat-pdf", post(chat::chat_pdf_handler))
        .route("/api/tutor", post(chat::tutor_handler))
        .route("/api/generate-notes", post(notes::generate_notes_handler))
        .route("/api/quiz", post(quiz::generate_quiz_handler))
        .route("/api/quiz/analyze", post(quiz::analyze_quiz_handler))
        .route("/api/schedule", post(schedule::generate_schedule_handler))
        .route("/api/send-otp", post(otp::send_otp_handler))
        .route("/api/verify-otp", post(otp::verify_otp_handler))
        .route("/health", get(health::health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
