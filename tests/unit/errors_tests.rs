/*!
 * Tests for error types and conversions
 */

use scenecast::errors::{AppError, PlaybackError, SynthesisError};

#[test]
fn test_synthesisError_requestFailed_shouldDisplayCorrectly() {
    let error = SynthesisError::RequestFailed("Connection timeout".to_string());
    let display = format!("{}", error);
    assert!(display.contains("API request failed"));
    assert!(display.contains("Connection timeout"));
}

#[test]
fn test_synthesisError_parseError_shouldDisplayCorrectly() {
    let error = SynthesisError::ParseError("Invalid JSON".to_string());
    let display = format!("{}", error);
    assert!(display.contains("Failed to parse API response"));
    assert!(display.contains("Invalid JSON"));
}

#[test]
fn test_synthesisError_apiError_shouldDisplayStatusAndMessage() {
    let error = SynthesisError::ApiError {
        status_code: 429,
        message: "Too many requests".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("429"));
    assert!(display.contains("Too many requests"));
}

#[test]
fn test_synthesisError_connectionError_shouldDisplayCorrectly() {
    let error = SynthesisError::ConnectionError("Host unreachable".to_string());
    let display = format!("{}", error);
    assert!(display.contains("Connection error"));
    assert!(display.contains("Host unreachable"));
}

#[test]
fn test_synthesisError_rateLimited_shouldDisplayCorrectly() {
    let error = SynthesisError::RateLimited("Retry after 60s".to_string());
    let display = format!("{}", error);
    assert!(display.contains("Rate limit exceeded"));
    assert!(display.contains("Retry after 60s"));
}

#[test]
fn test_synthesisError_unusable_shouldDisplayVoiceAndReason() {
    let error = SynthesisError::Unusable {
        voice_id: "narrator-a".to_string(),
        reason: "empty payload".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("narrator-a"));
    assert!(display.contains("empty payload"));
}

#[test]
fn test_synthesisError_isRateLimit_shouldMatchOnlyRateLimited() {
    assert!(SynthesisError::RateLimited("slow down".to_string()).is_rate_limit());
    assert!(!SynthesisError::RequestFailed("boom".to_string()).is_rate_limit());
    assert!(!SynthesisError::ApiError { status_code: 500, message: "oops".to_string() }.is_rate_limit());
}

#[test]
fn test_synthesisError_clone_shouldCompareEqual() {
    let error = SynthesisError::RateLimited("slow down".to_string());
    let copy = error.clone();
    assert_eq!(error, copy);
}

#[test]
fn test_playbackError_synthesisFailed_shouldDisplaySceneAndParts() {
    let error = PlaybackError::SynthesisFailed {
        scene_index: 2,
        part_indices: vec![0, 3],
    };
    let display = format!("{}", error);
    assert!(display.contains("scene 2"));
    assert!(display.contains("[0, 3]"));
}

#[test]
fn test_playbackError_coverageMissing_shouldDisplayFirstGap() {
    let error = PlaybackError::CoverageMissing { scene_index: 1 };
    let display = format!("{}", error);
    assert!(display.contains("Voice coverage missing"));
    assert!(display.contains("scene 1"));
}

#[test]
fn test_playbackError_cancelled_shouldDisplayCorrectly() {
    let display = format!("{}", PlaybackError::Cancelled);
    assert!(display.contains("Playback cancelled"));
}

#[test]
fn test_playbackError_invalidTimeline_shouldDisplayReason() {
    let error = PlaybackError::InvalidTimeline("scene 0 has zero duration".to_string());
    let display = format!("{}", error);
    assert!(display.contains("Invalid timeline"));
    assert!(display.contains("zero duration"));
}

#[test]
fn test_appError_fromSynthesisError_shouldWrapCorrectly() {
    let synthesis_error = SynthesisError::ConnectionError("Network down".to_string());
    let app_error: AppError = synthesis_error.into();
    let display = format!("{}", app_error);
    assert!(display.contains("Synthesis error"));
}

#[test]
fn test_appError_fromPlaybackError_shouldWrapCorrectly() {
    let playback_error = PlaybackError::Cancelled;
    let app_error: AppError = playback_error.into();
    let display = format!("{}", app_error);
    assert!(display.contains("Playback error"));
}

#[test]
fn test_appError_fromIoError_shouldWrapAsFileError() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
    let app_error: AppError = io_error.into();
    let display = format!("{}", app_error);
    assert!(display.contains("File error"));
    assert!(display.contains("File not found"));
}

#[test]
fn test_appError_fromSerdeError_shouldWrapAsFileError() {
    let serde_error = serde_json::from_str::<scenecast::timeline::Timeline>("not json").unwrap_err();
    let app_error: AppError = serde_error.into();
    let display = format!("{}", app_error);
    assert!(display.contains("File error"));
}

#[test]
fn test_appError_fromAnyhowError_shouldWrapAsUnknown() {
    let anyhow_error = anyhow::anyhow!("Something went wrong");
    let app_error: AppError = anyhow_error.into();
    let display = format!("{}", app_error);
    assert!(display.contains("Unknown error"));
    assert!(display.contains("Something went wrong"));
}

#[test]
fn test_appError_config_shouldDisplayCorrectly() {
    let error = AppError::Config("speed must be positive".to_string());
    let display = format!("{}", error);
    assert!(display.contains("Config error"));
    assert!(display.contains("speed must be positive"));
}

#[test]
fn test_playbackError_debug_shouldBeImplemented() {
    let error = PlaybackError::CoverageMissing { scene_index: 0 };
    let debug = format!("{:?}", error);
    assert!(debug.contains("CoverageMissing"));
}

#[test]
fn test_appError_debug_shouldBeImplemented() {
    let error = AppError::File("test".to_string());
    let debug = format!("{:?}", error);
    assert!(debug.contains("File"));
}
