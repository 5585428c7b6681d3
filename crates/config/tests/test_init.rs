//! Tests for config initialization

use cmop_config::{init_at, resolve_path, Config};
use std::path::PathBuf;
use tempfile::TempDir;

#[tokio::test]
async fn test_init_writes_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(".cmop").join("config.json");
    assert!(!path.exists());

    let config = init_at(&path).await.expect("init failed");

    assert!(path.exists());
    assert_eq!(config.llm.model, "qwen2.5:14b-instruct");
}

#[tokio::test]
async fn test_init_keeps_existing_config() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");

    let mut config = Config::default();
    config.llm.model = "existing-model".to_string();
    config.save_to(&path).await.unwrap();

    let loaded = init_at(&path).await.expect("init failed");
    assert_eq!(loaded.llm.model, "existing-model");
}

#[test]
fn test_resolve_path_prefers_explicit() {
    let explicit = PathBuf::from("/tmp/custom.json");
    assert_eq!(resolve_path(Some(explicit.clone())), explicit);
    assert!(resolve_path(None).ends_with("config.json"));
}
