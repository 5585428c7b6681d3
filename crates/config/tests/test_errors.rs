//! Tests for error handling

use cmop_config::ConfigError;
use std::io;

#[test]
fn test_io_error_display() {
    let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let err = ConfigError::Io(io_err);

    let display = format!("{}", err);
    assert!(display.contains("config io error"));
    assert!(display.contains("file not found"));
}

#[test]
fn test_json_error_display() {
    let json_err: serde_json::Error =
        serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
    let err = ConfigError::Json(json_err);

    assert!(err.to_string().contains("config parse error"));
}

#[test]
fn test_invalid_env_display() {
    let err = ConfigError::InvalidEnv {
        key: "CMOP_MAX_ITERATIONS".to_string(),
        value: "abc".to_string(),
    };
    assert_eq!(err.to_string(), "invalid value for CMOP_MAX_ITERATIONS: abc");
}

#[test]
fn test_io_error_from() {
    let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "no permission");
    let err: ConfigError = io_err.into();
    assert!(matches!(err, ConfigError::Io(_)));
}
