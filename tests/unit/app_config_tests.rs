/*!
 * Tests for configuration files
 */

use chunkwise::app_config::{Config, LogLevel, SamplingValue};
use chunkwise::document::WriteMode;

use crate::common::{create_temp_dir, create_test_file};

#[test]
fn test_fromFile_withFullConfig_shouldReadEverySection() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(
        dir.path(),
        "conf.json",
        r#"{
            "target_language": "ja",
            "translation": {
                "max_chunk_tokens": 1200,
                "gap_rate": 0.2,
                "concurrent_requests": 4,
                "user_prompt": "Use polite forms.",
                "cache_enabled": false,
                "write_mode": "replace"
            },
            "provider": {
                "endpoint": "http://localhost:11434/v1",
                "model": "qwen2.5",
                "retry_times": 2,
                "retry_interval_secs": 0.5,
                "temperature": [0.3, 0.9]
            },
            "log_level": "debug"
        }"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.translation.write_mode, WriteMode::Replace);
    assert_eq!(config.provider.temperature, Some(SamplingValue::Range(0.3, 0.9)));
    assert_eq!(config.log_level, LogLevel::Debug);

    let options = config.translation_options().unwrap();
    assert_eq!(options.target_language, "ja");
    assert_eq!(options.max_chunk_tokens, 1200);
    assert_eq!(options.max_concurrent_requests, 4);
    assert_eq!(options.user_prompt.as_deref(), Some("Use polite forms."));

    let retry = config.provider.retry_policy();
    assert_eq!(retry.retry_times, 2);
    assert_eq!(retry.retry_interval.as_millis(), 500);
}

#[test]
fn test_save_shouldRoundTripThroughDisk() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("saved.json");
    let mut config = Config::default();
    config.translation.user_prompt = Some("Keep it short.".to_string());

    config.save(&path).unwrap();

    assert_eq!(Config::from_file(&path).unwrap(), config);
}

#[test]
fn test_fromFile_withBrokenJson_shouldFail() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(dir.path(), "conf.json", "{ not json").unwrap();
    assert!(Config::from_file(&path).is_err());
}

#[test]
fn test_validate_withZeroConcurrency_shouldFail() {
    let mut config = Config::default();
    config.provider.api_key = "sk-test".to_string();
    assert!(config.validate().is_ok());

    config.translation.concurrent_requests = 0;
    assert!(config.validate().is_err());
}
