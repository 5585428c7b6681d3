//! Tests for Config defaults, serialization and file round-trips

use cmop_config::{AgentConfig, CmopApiConfig, Config, LlmConfig};
use std::time::Duration;
use tempfile::TempDir;

/// Helper to create a temporary directory for tests
fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_config_defaults() {
    let config = Config::default();

    assert_eq!(config.cmop.api_base, "http://localhost:3000");
    assert_eq!(config.cmop.request_timeout_secs, 30.0);
    assert_eq!(config.llm.model, "qwen2.5:14b-instruct");
    assert_eq!(config.llm.api_base, "http://localhost:11434/v1");
    assert!(config.llm.api_key.is_empty());
    assert_eq!(config.llm.max_tokens, 4096);
    assert_eq!(config.agent.max_iterations, 15);
}

#[test]
fn test_section_defaults_match_root() {
    let config = Config::default();
    assert_eq!(CmopApiConfig::default().api_base, config.cmop.api_base);
    assert_eq!(LlmConfig::default().model, config.llm.model);
    assert_eq!(
        AgentConfig::default().max_iterations,
        config.agent.max_iterations
    );
}

#[test]
fn test_partial_json_fills_defaults() {
    let json = r#"{ "cmop": { "api_base": "http://10.0.0.5:3000" } }"#;
    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.cmop.api_base, "http://10.0.0.5:3000");
    assert_eq!(config.cmop.request_timeout_secs, 30.0);
    assert_eq!(config.llm.model, "qwen2.5:14b-instruct");
    assert_eq!(config.agent.max_iterations, 15);
}

#[test]
fn test_empty_json_is_default() {
    let config: Config = serde_json::from_str("{}").unwrap();
    assert_eq!(config.cmop.api_base, "http://localhost:3000");
    assert_eq!(config.agent.max_iterations, 15);
}

#[test]
fn test_api_base_trims_trailing_slash() {
    let mut config = Config::default();
    config.cmop.api_base = "http://cmop.local:3000/".to_string();
    assert_eq!(config.api_base(), "http://cmop.local:3000");
}

#[test]
fn test_request_timeout_duration() {
    let mut config = Config::default();
    config.cmop.request_timeout_secs = 2.5;
    assert_eq!(config.request_timeout(), Duration::from_millis(2500));
}

#[test]
fn test_llm_api_key_empty_is_none() {
    let mut config = Config::default();
    assert!(config.llm_api_key().is_none());

    config.llm.api_key = "sk-test".to_string();
    assert_eq!(config.llm_api_key(), Some("sk-test".to_string()));
}

#[tokio::test]
async fn test_save_and_load_round_trip() {
    let dir = temp_dir();
    let path = dir.path().join("nested").join("config.json");

    let mut config = Config::default();
    config.llm.model = "llama3:70b".to_string();
    config.agent.max_iterations = 7;
    config.save_to(&path).await.expect("Failed to save");

    let loaded = Config::load_from(&path).await.expect("Failed to load");
    assert_eq!(loaded.llm.model, "llama3:70b");
    assert_eq!(loaded.agent.max_iterations, 7);
}

#[tokio::test]
async fn test_load_missing_file_returns_defaults() {
    let dir = temp_dir();
    let path = dir.path().join("does_not_exist.json");

    let config = Config::load_from(&path).await.expect("Failed to load");
    assert_eq!(config.cmop.api_base, "http://localhost:3000");
}

#[tokio::test]
async fn test_load_invalid_json_fails() {
    let dir = temp_dir();
    let path = dir.path().join("config.json");
    tokio::fs::write(&path, "{ not json").await.unwrap();

    let result = Config::load_from(&path).await;
    assert!(matches!(result, Err(cmop_config::ConfigError::Json(_))));
}

#[test]
fn test_env_overrides() {
    let mut config = Config::default();
    config
        .apply_env_from(|key| match key {
            "CMOP_API_BASE" => Some("http://10.0.0.5:3000".to_string()),
            "CMOP_MODEL" => Some("llama3:70b".to_string()),
            "CMOP_MAX_ITERATIONS" => Some("25".to_string()),
            "CMOP_REQUEST_TIMEOUT" => Some("12.5".to_string()),
            _ => None,
        })
        .unwrap();

    assert_eq!(config.cmop.api_base, "http://10.0.0.5:3000");
    assert_eq!(config.llm.model, "llama3:70b");
    assert_eq!(config.agent.max_iterations, 25);
    assert_eq!(config.cmop.request_timeout_secs, 12.5);
    // untouched
    assert_eq!(config.llm.api_base, "http://localhost:11434/v1");
}

#[test]
fn test_env_override_rejects_garbage() {
    let mut config = Config::default();
    let result = config.apply_env_from(|key| {
        (key == "CMOP_MAX_ITERATIONS").then(|| "many".to_string())
    });

    match result {
        Err(cmop_config::ConfigError::InvalidEnv { key, value }) => {
            assert_eq!(key, "CMOP_MAX_ITERATIONS");
            assert_eq!(value, "many");
        }
        other => panic!("Expected InvalidEnv, got {:?}", other),
    }
    assert_eq!(config.agent.max_iterations, 15);
}
