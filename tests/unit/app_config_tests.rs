/*!
 * Tests for application configuration functionality
 */

use std::str::FromStr;

use scenecast::app_config::{Config, LogLevel, SynthesisProvider};

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    // Playback defaults
    assert_eq!(config.playback.speed, 1.0);
    assert_eq!(config.playback.scrub_frame_ms, 16);
    assert_eq!(config.playback.group_dwell_fallback_secs, 1.0);

    // Synthesis defaults
    assert_eq!(config.synthesis.provider, SynthesisProvider::Http);
    assert_eq!(config.synthesis.endpoint, "http://localhost:8880");
    assert_eq!(config.synthesis.api_key, "");
    assert_eq!(config.synthesis.model, "tts-1");
    assert_eq!(config.synthesis.batch_size, 4);
    assert_eq!(config.synthesis.batch_delay_ms, 250);
    assert_eq!(config.synthesis.batch_delay_max_ms, 8000);
    assert_eq!(config.synthesis.retry_count, 3);
    assert_eq!(config.synthesis.retry_backoff_ms, 1000);
    assert_eq!(config.synthesis.timeout_secs, 30);

    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    // Start with a valid config
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    // Playback speed must be positive and finite
    config.playback.speed = 0.0;
    assert!(config.validate().is_err());
    config.playback.speed = f64::NAN;
    assert!(config.validate().is_err());
    config.playback.speed = 1.0;

    // Zero scrub frame interval is rejected
    config.playback.scrub_frame_ms = 0;
    assert!(config.validate().is_err());
    config.playback.scrub_frame_ms = 16;

    // Group dwell fallback must be positive
    config.playback.group_dwell_fallback_secs = 0.0;
    assert!(config.validate().is_err());
    config.playback.group_dwell_fallback_secs = 1.0;

    // Batch size of zero is rejected
    config.synthesis.batch_size = 0;
    assert!(config.validate().is_err());
    config.synthesis.batch_size = 4;

    // Delay ceiling below the base delay is rejected
    config.synthesis.batch_delay_max_ms = 100;
    assert!(config.validate().is_err());
    config.synthesis.batch_delay_max_ms = 8000;

    assert!(config.validate().is_ok());
}

/// Test endpoint requirements per provider
#[test]
fn test_config_validation_withEndpoints_shouldDependOnProvider() {
    let mut config = Config::default();

    // The HTTP provider requires a well-formed endpoint
    config.synthesis.endpoint = "".to_string();
    assert!(config.validate().is_err());

    config.synthesis.endpoint = "not a url".to_string();
    assert!(config.validate().is_err());

    config.synthesis.endpoint = "http://localhost:8880".to_string();
    assert!(config.validate().is_ok());

    // The mock provider runs offline and needs no endpoint
    config.synthesis.provider = SynthesisProvider::Mock;
    config.synthesis.endpoint = "".to_string();
    assert!(config.validate().is_ok());
}

/// Test that an empty document falls back to defaults everywhere
#[test]
fn test_config_fromEmptyJson_shouldUseDefaults() {
    let config: Config = serde_json::from_str("{}").unwrap();

    assert_eq!(config.playback.speed, 1.0);
    assert_eq!(config.synthesis.provider, SynthesisProvider::Http);
    assert_eq!(config.synthesis.batch_size, 4);
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test that a full document overrides every default
#[test]
fn test_config_fromFullJson_shouldOverrideDefaults() {
    let json = r#"{
        "playback": {
            "speed": 1.5,
            "scrub_frame_ms": 33,
            "group_dwell_fallback_secs": 2.0
        },
        "synthesis": {
            "provider": "mock",
            "endpoint": "http://tts.internal:9000",
            "api_key": "sk-test",
            "model": "tts-1-hd",
            "batch_size": 2,
            "batch_delay_ms": 100,
            "batch_delay_max_ms": 400,
            "retry_count": 5,
            "retry_backoff_ms": 2000,
            "timeout_secs": 10
        },
        "log_level": "debug"
    }"#;

    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.playback.speed, 1.5);
    assert_eq!(config.playback.scrub_frame_ms, 33);
    assert_eq!(config.playback.group_dwell_fallback_secs, 2.0);
    assert_eq!(config.synthesis.provider, SynthesisProvider::Mock);
    assert_eq!(config.synthesis.endpoint, "http://tts.internal:9000");
    assert_eq!(config.synthesis.api_key, "sk-test");
    assert_eq!(config.synthesis.model, "tts-1-hd");
    assert_eq!(config.synthesis.batch_size, 2);
    assert_eq!(config.synthesis.batch_delay_ms, 100);
    assert_eq!(config.synthesis.batch_delay_max_ms, 400);
    assert_eq!(config.synthesis.retry_count, 5);
    assert_eq!(config.synthesis.retry_backoff_ms, 2000);
    assert_eq!(config.synthesis.timeout_secs, 10);
    assert_eq!(config.log_level, LogLevel::Debug);

    assert!(config.validate().is_ok());
}

/// Test round-tripping a config through serialization
#[test]
fn test_config_serializationRoundTrip_shouldPreserveValues() {
    let mut config = Config::default();
    config.playback.speed = 2.0;
    config.synthesis.provider = SynthesisProvider::Mock;
    config.log_level = LogLevel::Trace;

    let json = serde_json::to_string_pretty(&config).unwrap();
    let parsed: Config = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.playback.speed, 2.0);
    assert_eq!(parsed.synthesis.provider, SynthesisProvider::Mock);
    assert_eq!(parsed.log_level, LogLevel::Trace);
}

/// Test provider naming helpers
#[test]
fn test_synthesisProvider_nameHelpers_shouldMatchVariants() {
    assert_eq!(SynthesisProvider::Http.display_name(), "HTTP");
    assert_eq!(SynthesisProvider::Mock.display_name(), "Mock");

    assert_eq!(SynthesisProvider::Http.to_string(), "http");
    assert_eq!(SynthesisProvider::Mock.to_string(), "mock");
}

/// Test provider parsing from strings
#[test]
fn test_synthesisProvider_fromStr_shouldParseKnownNamesOnly() {
    assert_eq!(SynthesisProvider::from_str("http").unwrap(), SynthesisProvider::Http);
    assert_eq!(SynthesisProvider::from_str("Mock").unwrap(), SynthesisProvider::Mock);
    assert_eq!(SynthesisProvider::from_str("HTTP").unwrap(), SynthesisProvider::Http);

    assert!(SynthesisProvider::from_str("elevenlabs").is_err());
    assert!(SynthesisProvider::from_str("").is_err());
}
