//! Tests for schedule generation through a scripted completion service

mod common;

use common::ScriptedService;
use edugenie_core::providers::ProviderError;
use edugenie_core::schedule::{ScheduleError, ScheduleGenerator, ScheduleRequest, ScheduleSettings};
use test_case::test_case;

fn request() -> ScheduleRequest {
    serde_json::from_value(serde_json::json!({
        "subjects": ["Chemistry", "History"],
        "startDate": "2026-05-04",
        "endDate": "2026-05-06",
        "preferences": "mornings"
    }))
    .unwrap()
}

#[tokio::test]
async fn test_generates_events_from_fenced_reply() {
    let reply = r#"Here is the plan:
```json
{"events": [
  {"title": "Acids", "date": "2026-05-05", "startTime": "09:00", "endTime": "10:30", "subject": "Chemistry"},
  {"title": "Outside range", "date": "2026-05-09", "startTime": "09:00", "endTime": "10:00"},
  {"title": "Revolutions", "date": "2026-05-04", "startTime": "09:00", "endTime": "10:00", "subject": "History"}
]}
```"#;
    let service = ScriptedService::replying(&[(reply, "stop")]);
    let settings = ScheduleSettings::default();

    let events = ScheduleGenerator::new(&service, &settings)
        .generate(&request())
        .await
        .unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].title, "Revolutions");
    assert_eq!(events[1].title, "Acids");

    let prompt = &service.requests()[0].messages[1].content;
    assert!(prompt.contains("Chemistry, History"));
    assert!(prompt.contains("Preferences: mornings"));
}

#[test_case("2026-05-04", "2026-05-03" ; "end before start")]
#[test_case("2026-05-04", "2026-07-04" ; "range too long")]
#[test_case("May 4", "2026-05-06" ; "not iso")]
#[tokio::test]
async fn test_invalid_requests_make_no_call(start: &str, end: &str) {
    let service = ScriptedService::always("[]", "stop");
    let settings = ScheduleSettings::default();
    let mut request = request();
    request.start_date = start.to_string();
    request.end_date = end.to_string();

    let result = ScheduleGenerator::new(&service, &settings).generate(&request).await;
    assert!(matches!(result, Err(ScheduleError::Validation(_))));
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn test_no_usable_events_is_malformed() {
    let service = ScriptedService::replying(&[(r#"[{"title": "Missing times", "date": "2026-05-04"}]"#, "stop")]);
    let settings = ScheduleSettings::default();

    let result = ScheduleGenerator::new(&service, &settings).generate(&request()).await;
    assert!(matches!(result, Err(ScheduleError::MalformedOutput(_))));
}

#[tokio::test]
async fn test_provider_error_is_not_retried() {
    let service = ScriptedService::new(vec![Err(ProviderError::Timeout(60))]);
    let settings = ScheduleSettings::default();

    let result = ScheduleGenerator::new(&service, &settings).generate(&request()).await;
    assert!(matches!(result, Err(ScheduleError::Provider(ProviderError::Timeout(60)))));
    assert_eq!(service.calls(), 1);
}
