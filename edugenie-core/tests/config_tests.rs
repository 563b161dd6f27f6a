//! Integration tests for configuration loading and validation

use edugenie_core::config::{load_from_yaml, parse_yaml, ConfigError, DEFAULT_MODEL};
use edugenie_core::continuation::ChatProfile;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_full_yaml_config() {
    std::env::set_var("EDUGENIE_TEST_FULL_KEY", "sk-from-env");

    let yaml = r#"
version: "0.1"
provider:
  api_key: ${EDUGENIE_TEST_FULL_KEY}
  base_url: http://localhost:8080/v1
  model: gpt-4o
  connection:
    request_timeout_ms: 30000
server:
  port: 8081
  allowed_origins:
    - http://localhost:3000
profiles:
  tutor:
    budget:
      max_output_tokens: 800
      max_input_tokens: 3000
      max_chunks: 3
    history_window: 4
    temperature: 0.5
quiz:
  temperature: 0.2
  retry:
    max_retries: 2
otp:
  ttl_secs: 120
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "edugenie.yaml", yaml);
    let config = load_from_yaml(&path).unwrap();

    assert_eq!(config.provider.api_key.expose_secret(), "sk-from-env");
    assert_eq!(config.provider.model, "gpt-4o");
    assert_eq!(config.provider.connection.request_timeout_ms, 30_000);
    assert_eq!(config.server.port, 8081);
    assert_eq!(config.profiles.tutor.budget.max_chunks, 3);
    assert_eq!(config.profiles.tutor.budget.max_input_chars(), 12_000);
    assert_eq!(config.profiles.tutor.top_p, None);
    assert_eq!(config.profiles.general_chat, ChatProfile::general_chat());
    assert_eq!(config.quiz.retry.max_retries, 2);
    assert_eq!(config.quiz.retry.initial_delay_ms, 1_000);
    assert_eq!(config.otp.ttl_secs, 120);
    assert_eq!(config.otp.code_length, 6);

    std::env::remove_var("EDUGENIE_TEST_FULL_KEY");
}

#[test]
fn test_minimal_config_uses_defaults() {
    let config = parse_yaml("version: \"0.1\"\nprovider:\n  api_key: sk-inline\n", "inline").unwrap();
    assert_eq!(config.provider.model, DEFAULT_MODEL);
    assert_eq!(config.profiles.pdf_chat.budget.max_input_tokens, 7000);
    assert_eq!(config.schedule.max_days, 60);
}

#[test]
fn test_missing_env_var() {
    let yaml = "version: \"0.1\"\nprovider:\n  api_key: ${EDUGENIE_TEST_NEVER_SET}\n";
    match parse_yaml(yaml, "inline") {
        Err(ConfigError::EnvVarNotFound { var }) => assert_eq!(var, "EDUGENIE_TEST_NEVER_SET"),
        other => panic!("Expected EnvVarNotFound, got {:?}", other),
    }
}

#[test]
fn test_parse_error_reports_location() {
    let yaml = "version: \"0.1\"\nprovider:\n  api_key: [unclosed\n";
    match parse_yaml(yaml, "broken.yaml") {
        Err(ConfigError::ParseError { path, line, .. }) => {
            assert_eq!(path, "broken.yaml");
            assert!(line.is_some());
        }
        other => panic!("Expected ParseError, got {:?}", other),
    }
}

#[test]
fn test_validation_error_path() {
    let yaml = r#"
version: "0.1"
provider:
  api_key: sk-inline
profiles:
  general_chat:
    budget:
      max_output_tokens: 1500
      max_input_tokens: 6000
      max_chunks: 0
    history_window: 6
    temperature: 0.7
"#;
    match parse_yaml(yaml, "inline") {
        Err(ConfigError::ValidationError(error)) => {
            assert_eq!(error.field_path, "profiles.general_chat.budget.max_chunks");
        }
        other => panic!("Expected ValidationError, got {:?}", other),
    }
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = load_from_yaml(dir.path().join("absent.yaml"));
    assert!(matches!(result, Err(ConfigError::IoError { .. })));
}

#[test]
fn test_api_key_is_redacted_in_debug() {
    let config = parse_yaml("version: \"0.1\"\nprovider:\n  api_key: sk-very-secret-key\n", "inline").unwrap();
    let debug = format!("{:?}", config);
    assert!(!debug.contains("sk-very-secret-key"));
    assert!(debug.contains("[REDACTED]"));
}
