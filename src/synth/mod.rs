/*!
 * Speech synthesis providers.
 *
 * This module contains client implementations for turning part markup into
 * spoken audio:
 * - Http: remote TTS service over JSON
 * - Mock: deterministic offline synthesizer, also used for tests
 */

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt::Debug;

use crate::errors::SynthesisError;

/// Opaque audio payload produced by a provider.
///
/// The engine never inspects audio content; it only checks presence and
/// hands the payload to the audio output collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum VoicePayload {
    /// In-memory audio bytes
    Bytes(Bytes),
    /// Reference to audio hosted elsewhere
    Url(String),
}

impl VoicePayload {
    /// Whether the payload carries nothing playable.
    pub fn is_empty(&self) -> bool {
        match self {
            VoicePayload::Bytes(bytes) => bytes.is_empty(),
            VoicePayload::Url(url) => url.is_empty(),
        }
    }
}

/// Result of one synthesis call
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedVoice {
    /// Audio payload
    pub payload: VoicePayload,
    /// Spoken length in seconds, as reported by the provider
    pub duration_secs: f64,
}

/// Common trait for all speech synthesis providers
///
/// This trait defines the interface every provider implementation follows,
/// allowing them to be used interchangeably by the voice cache.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync + Debug {
    /// Synthesize one part markup with the given voice
    ///
    /// # Arguments
    /// * `voice_id` - Provider-side voice identifier
    /// * `markup` - Resolved part markup to speak
    ///
    /// # Returns
    /// * `Result<SynthesizedVoice, SynthesisError>` - Audio and duration, or an error
    async fn synthesize(
        &self,
        voice_id: &str,
        markup: &str,
    ) -> Result<SynthesizedVoice, SynthesisError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), SynthesisError> {
        Ok(())
    }

    /// Short provider name for logs
    fn name(&self) -> &'static str;
}

pub mod http;
pub mod mock;

pub use mock::MockSynthesizer;
