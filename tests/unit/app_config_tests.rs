/*!
 * Tests for application configuration functionality
 */

use std::time::Duration;

use article_translator::app_config::{Config, LogLevel, TranslationProvider};
use article_translator::errors::AppError;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "ko");
    assert_eq!(config.translation.provider, TranslationProvider::Google);
    assert_eq!(config.checkpoint.every_n, 5);
    assert!(config.checkpoint.progress_file.is_none());
    assert_eq!(config.log_level, LogLevel::Info);

    let google = config
        .translation
        .get_provider_config(&TranslationProvider::Google)
        .expect("Google provider config should exist");
    assert_eq!(google.max_chars_per_request, 4500);
    assert_eq!(google.timeout_secs, 30);

    assert_eq!(config.translation.get_rate_limit_cooldown(), Duration::from_secs(60));
    assert_eq!(config.translation.get_inter_request_delay(), Duration::from_millis(1000));
}

/// Each backend keeps its own request size
#[test]
fn test_max_chars_perProvider_shouldFollowActiveProvider() {
    let mut config = Config::default();

    let expected = [
        (TranslationProvider::Google, 4500),
        (TranslationProvider::MyMemory, 450),
        (TranslationProvider::LibreTranslate, 1500),
    ];

    for (provider, max_chars) in expected {
        config.translation.provider = provider;
        assert_eq!(config.translation.get_max_chars_per_request(), max_chars, "{}", provider);
    }
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    // Invalid source language
    config.source_language = "zz".to_string();
    assert!(config.validate().is_err());

    // Auto-detected source is allowed
    config.source_language = "auto".to_string();
    assert!(config.validate().is_ok());
    config.source_language = "en".to_string();

    // Empty target language
    config.target_language = String::new();
    assert!(config.validate().is_err());

    // Same language on both sides
    config.target_language = "eng".to_string();
    assert!(config.validate().is_err());
    config.target_language = "ko".to_string();

    // Zero chunk size
    config.translation.active_provider_config_mut().max_chars_per_request = 0;
    assert!(config.validate().is_err());
    config.translation.active_provider_config_mut().max_chars_per_request = 100;

    // Zero checkpoint cadence
    config.checkpoint.every_n = 0;
    assert!(config.validate().is_err());
    config.checkpoint.every_n = 1;

    // Unparsable endpoint
    config.translation.active_provider_config_mut().endpoint = "not a url".to_string();
    assert!(config.validate().is_err());
}

/// Validation failures are reported as configuration errors
#[test]
fn test_config_validation_withBadValues_shouldReturnConfigError() {
    let mut config = Config::default();
    config.checkpoint.every_n = 0;
    match config.validate() {
        Err(AppError::Config(message)) => assert!(message.contains("every_n")),
        other => panic!("expected a configuration error, got {:?}", other),
    }

    let mut config = Config::default();
    config.target_language = "en".to_string();
    assert!(matches!(config.validate(), Err(AppError::Config(_))));
}

/// A minimal config file fills in every missing section
#[test]
fn test_config_deserialization_withMinimalJson_shouldApplyDefaults() {
    let json = r#"{
        "source_language": "en",
        "target_language": "ja",
        "translation": { "provider": "mymemory" }
    }"#;

    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.translation.provider, TranslationProvider::MyMemory);
    assert_eq!(config.checkpoint.every_n, 5);
    assert_eq!(config.translation.get_endpoint(), "https://api.mymemory.translated.net");
    assert_eq!(config.translation.get_max_chars_per_request(), 450);
    assert!(config.validate().is_ok());
}

/// Saving and loading a config file keeps its values
#[test]
fn test_config_file_withSaveAndLoad_shouldPreserveValues() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("conf.json");

    let mut config = Config::default();
    config.target_language = "fr".to_string();
    config.translation.provider = TranslationProvider::LibreTranslate;
    config.translation.active_provider_config_mut().api_key = "secret".to_string();
    config.checkpoint.every_n = 2;
    config.save_to_file(&path).unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded.target_language, "fr");
    assert_eq!(loaded.translation.provider, TranslationProvider::LibreTranslate);
    assert_eq!(loaded.translation.get_api_key(), "secret");
    assert_eq!(loaded.checkpoint.every_n, 2);
}

/// Loading a missing file reports the path
#[test]
fn test_load_from_file_withMissingFile_shouldFail() {
    let error = Config::load_from_file("/nonexistent/conf.json").unwrap_err();
    assert!(format!("{:#}", error).contains("/nonexistent/conf.json"));
}
