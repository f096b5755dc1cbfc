/*!
 * Error types for the scenecast engine.
 *
 * This module contains custom error types for different parts of the engine,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur when talking to a speech synthesis service.
///
/// Clone is derived so results can be fanned out through shared in-flight
/// futures when several callers wait on the same synthesis.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthesisError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// The service answered but the audio is unusable (empty payload or
    /// zero duration)
    #[error("Unusable audio for voice '{voice_id}': {reason}")]
    Unusable {
        /// Voice the synthesis was requested for
        voice_id: String,
        /// What made the result unusable
        reason: String,
    },
}

impl SynthesisError {
    /// Whether the error is a rate-limit signal the batch pacer should
    /// react to.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, SynthesisError::RateLimited(_))
    }
}

/// Errors that can occur while driving playback
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// One or more parts of a scene could not be synthesized
    #[error("Synthesis failed for scene {scene_index}: parts {part_indices:?}")]
    SynthesisFailed {
        /// Scene the failure belongs to
        scene_index: usize,
        /// Part indices that never produced usable audio
        part_indices: Vec<usize>,
    },

    /// A scrub or seek was attempted before the whole timeline had
    /// usable audio
    #[error("Voice coverage missing, first gap at scene {scene_index}")]
    CoverageMissing {
        /// First scene found without full coverage
        scene_index: usize,
    },

    /// The timeline failed structural validation
    #[error("Invalid timeline: {0}")]
    InvalidTimeline(String),

    /// The audio output collaborator failed outright
    #[error("Audio output error: {0}")]
    Audio(String),

    /// The session token was cancelled while the operation was in flight
    #[error("Playback cancelled")]
    Cancelled,
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from configuration loading or validation
    #[error("Config error: {0}")]
    Config(String),

    /// Error from a synthesis provider
    #[error("Synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    /// Error from the playback engine
    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::File(error.to_string())
    }
}
