/*!
 * Tests for application configuration functionality
 */

use langie::app_config::{Config, LogLevel};
use std::time::Duration;
use tempfile::TempDir;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.translator_host, "https://api.langie.uk/v1");
    assert_eq!(config.default_language, "en");
    assert_eq!(config.default_context, "ui");
    assert!(config.source_language.is_none());
    assert!(config.api_key.is_none());

    assert_eq!(config.batching.initial_batch_delay(), Duration::from_millis(50));
    assert_eq!(config.batching.followup_batch_delay(), Duration::from_millis(25));
    assert_eq!(config.batching.max_wait_time(), Duration::from_millis(2000));
    assert_eq!(config.batching.max_batch_size, 50);

    assert!(!config.cache.persist);
    assert_eq!(config.cache.max_items, 1000);
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.default_language = "not a tag".to_string();
    assert!(config.validate().is_err());
    config.default_language = "sr-latn".to_string();
    assert!(config.validate().is_ok());

    config.source_language = Some("x".to_string());
    assert!(config.validate().is_err());
    config.source_language = Some("es".to_string());

    config.default_context = " ".to_string();
    assert!(config.validate().is_err());
    config.default_context = "article".to_string();

    config.http.timeout_secs = 0;
    assert!(config.validate().is_err());
    config.http.timeout_secs = 5;

    assert!(config.validate().is_ok());
}

/// Test that partial JSON files are completed with defaults
#[test]
fn test_from_file_withPartialJson_shouldFillDefaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conf.json");
    std::fs::write(
        &path,
        r#"{ "translator_host": "http://localhost:8081", "batching": { "max_batch_size": 10 }, "log_level": "debug" }"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();

    assert_eq!(config.translator_host, "http://localhost:8081");
    assert_eq!(config.batching.max_batch_size, 10);
    assert_eq!(config.batching.initial_batch_delay_ms, 50);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.log_level.to_level_filter(), log::LevelFilter::Debug);
}

/// Test that a missing file is created with defaults
#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conf.json");

    let created = Config::load_or_create(&path).unwrap();
    assert!(path.exists());

    let reloaded = Config::load_or_create(&path).unwrap();
    assert_eq!(reloaded.translator_host, created.translator_host);
    assert_eq!(reloaded.batching.max_batch_size, created.batching.max_batch_size);
}

/// Test that unreadable JSON is reported
#[test]
fn test_from_file_withInvalidJson_shouldFail() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conf.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(Config::from_file(&path).is_err());
}
