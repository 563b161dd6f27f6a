//! Tests for the retry executor and quiz retry behavior

mod common;

use common::ScriptedService;
use edugenie_core::providers::{ProviderError, RetryExecutor, RetryPolicy};
use edugenie_core::quiz::{QuizError, QuizGenerator, QuizRequest, QuizSettings};
use std::sync::atomic::{AtomicU32, Ordering};

/// Same shape as the quiz policy but fast enough for tests
fn fast_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        initial_delay_ms: 1,
        max_delay_ms: 8,
        exponential_base: 2.0,
        jitter_factor: 0.0,
        respect_retry_after: false,
        timeout_ms: None,
    }
}

fn fast_settings() -> QuizSettings {
    QuizSettings {
        retry: fast_policy(4),
        ..QuizSettings::default()
    }
}

const GOOD_QUIZ: &str = r#"{"questions": [
    {"question": "Largest organ?", "options": ["Skin", "Liver"], "answer": "Skin", "topic": "Anatomy"}
]}"#;

#[tokio::test]
async fn test_executor_succeeds_after_transient_failures() {
    let attempts = AtomicU32::new(0);
    let attempts = &attempts;
    let executor = RetryExecutor::new(fast_policy(3));

    let result = executor
        .execute(|| async move {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(ProviderError::ServiceUnavailable("busy".to_string()))
            } else {
                Ok(n)
            }
        })
        .await;

    assert_eq!(result.retries, 2);
    assert_eq!(result.error_history, vec!["Service temporarily unavailable: busy"; 2]);
    assert_eq!(result.into_result().unwrap(), 2);
}

#[tokio::test]
async fn test_executor_stops_on_permanent_error() {
    let counter = AtomicU32::new(0);
    let attempts = &counter;
    let executor = RetryExecutor::new(fast_policy(3));

    let result: Result<(), _> = executor
        .execute(|| async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::Authentication("bad key".to_string()))
        })
        .await
        .into_result();

    assert!(matches!(result, Err(ProviderError::Authentication(_))));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_quiz_retries_malformed_output() {
    common::init_tracing();
    let service = ScriptedService::replying(&[
        ("Sorry, I cannot do that.", "stop"),
        (r#"{"questions": [{"question": "no options"}]}"#, "stop"),
        (GOOD_QUIZ, "stop"),
    ]);
    let settings = fast_settings();

    let questions = QuizGenerator::new(&service, &settings)
        .generate(&QuizRequest::new("Biology", 1))
        .await
        .unwrap();

    assert_eq!(service.calls(), 3);
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].correct_option(), "Skin");
}

#[tokio::test]
async fn test_quiz_gives_up_after_five_attempts() {
    let service = ScriptedService::always("not json at all", "stop");
    let settings = fast_settings();

    let error = QuizGenerator::new(&service, &settings)
        .generate(&QuizRequest::new("Biology", 3))
        .await
        .unwrap_err();

    assert!(matches!(error, QuizError::MalformedOutput(_)));
    assert_eq!(service.calls(), 5);
}

#[tokio::test]
async fn test_quiz_does_not_retry_auth_errors() {
    let service = ScriptedService::new(vec![Err(ProviderError::Authentication("bad key".to_string()))]);
    let settings = fast_settings();

    let error = QuizGenerator::new(&service, &settings)
        .generate(&QuizRequest::new("Biology", 3))
        .await
        .unwrap_err();

    assert!(matches!(error, QuizError::Provider(ProviderError::Authentication(_))));
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn test_quiz_validation_makes_no_calls() {
    let service = ScriptedService::always(GOOD_QUIZ, "stop");
    let settings = fast_settings();
    let generator = QuizGenerator::new(&service, &settings);

    assert!(matches!(
        generator.generate(&QuizRequest::new("  ", 3)).await,
        Err(QuizError::Validation(_))
    ));
    assert!(matches!(
        generator.generate(&QuizRequest::new("Biology", 21)).await,
        Err(QuizError::Validation(_))
    ));
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn test_quiz_trims_extra_questions() {
    let reply = r#"[
        {"question": "Q1", "options": ["a", "b"], "answer": 0},
        {"question": "Q2", "options": ["a", "b"], "answer": 1},
        {"question": "Q3", "options": ["a", "b"], "answer": "a"}
    ]"#;
    let service = ScriptedService::replying(&[(reply, "stop")]);
    let settings = fast_settings();

    let questions = QuizGenerator::new(&service, &settings)
        .generate(&QuizRequest::new("Letters", 2))
        .await
        .unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[1].question, "Q2");
}
