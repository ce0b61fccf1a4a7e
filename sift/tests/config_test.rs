//! Loading client configuration from disk.

use sift::{AuthConfig, SearchClient, SiftConfig, SiftError};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_missing_file_yields_defaults() {
    let temp = TempDir::new().unwrap();
    let config = SiftConfig::load_or_default(&temp.path().join("sift.toml")).unwrap();
    assert_eq!(config, SiftConfig::default());
}

#[test]
fn test_load_from_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("sift.toml");
    fs::write(
        &path,
        r#"
endpoint = "http://search.example.com:9200"
index = "meals"
request_timeout_ms = 1500

[auth]
method = "basic"
username = "reader"
password = "secret"

[logging]
level = "sift=debug"
"#,
    )
    .unwrap();

    let config = SiftConfig::load_or_default(&path).unwrap();
    assert_eq!(config.endpoint, "http://search.example.com:9200");
    assert_eq!(config.index, "meals");
    assert_eq!(config.request_timeout(), Duration::from_millis(1500));
    assert_eq!(
        config.auth,
        Some(AuthConfig::Basic {
            username: "reader".to_string(),
            password: "secret".to_string(),
        })
    );
    assert_eq!(config.logging.level, "sift=debug");
    assert_eq!(config.logging.format, "pretty");

    // A loaded config is accepted by the client as-is
    SearchClient::new(config).unwrap();
}

#[test]
fn test_malformed_file_is_config_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("sift.toml");
    fs::write(&path, "endpoint = [").unwrap();

    let err = SiftConfig::load_or_default(&path).unwrap_err();
    assert!(matches!(err, SiftError::Config(ref m) if m.contains("sift.toml")));
    assert_eq!(err.error_type(), "config");
}

#[test]
fn test_client_rejects_invalid_loaded_config() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("sift.toml");
    fs::write(&path, "request_timeout_ms = 0\n").unwrap();

    let config = SiftConfig::load_or_default(&path).unwrap();
    assert!(matches!(
        SearchClient::new(config),
        Err(SiftError::Config(_))
    ));
}
