/*!
 * Mock synthesizer for testing and offline preview.
 *
 * This module provides a synthesizer that simulates different behaviors:
 * - `MockSynthesizer::working()` - Always succeeds with stub audio
 * - `MockSynthesizer::rate_limited_every(n)` - Rejects every Nth request
 * - `MockSynthesizer::failing()` - Always fails with an error
 *
 * Durations derive deterministically from markup length, so timing math is
 * exercisable without a real service. The call counter is shared across
 * clones, which is what de-duplication tests assert against.
 */

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::SynthesisError;
use crate::synth::{SpeechSynthesizer, SynthesizedVoice, VoicePayload};

/// Simulated reading speed used to derive durations from markup
const CHARS_PER_SECOND: f64 = 15.0;

/// Shortest duration the mock ever reports
const MIN_DURATION_SECS: f64 = 0.4;

/// Behavior mode for the mock synthesizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with stub audio
    Working,
    /// Always fails with a server error
    Failing,
    /// Rejects every Nth request with a rate-limit error
    RateLimitedEvery { every: usize },
    /// Succeeds but reports zero-length audio
    Unusable,
    /// Simulates slow synthesis (for cancellation and timeout testing)
    Slow { delay_ms: u64 },
}

/// Mock synthesizer with steerable behavior and a shared call counter
#[derive(Debug)]
pub struct MockSynthesizer {
    /// Behavior mode
    behavior: MockBehavior,
    /// Total synthesize calls, shared across clones
    request_count: Arc<AtomicUsize>,
    /// Exact durations for specific markups, overriding the derived ones
    scripted_durations: HashMap<String, f64>,
}

impl MockSynthesizer {
    /// Create a new mock synthesizer with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            scripted_durations: HashMap::new(),
        }
    }

    /// Create a working mock that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a failing mock that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that hits a rate limit on every Nth request
    pub fn rate_limited_every(every: usize) -> Self {
        Self::new(MockBehavior::RateLimitedEvery { every })
    }

    /// Create a mock that returns unusable zero-length audio
    pub fn unusable() -> Self {
        Self::new(MockBehavior::Unusable)
    }

    /// Create a slow mock for cancellation testing
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Pin the duration reported for one specific markup
    pub fn with_duration_for(mut self, markup: impl Into<String>, duration_secs: f64) -> Self {
        self.scripted_durations.insert(markup.into(), duration_secs);
        self
    }

    /// Number of synthesize calls made so far
    pub fn call_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Duration the mock reports for a markup
    pub fn duration_for(&self, markup: &str) -> f64 {
        if let Some(scripted) = self.scripted_durations.get(markup) {
            return *scripted;
        }
        (markup.chars().count() as f64 / CHARS_PER_SECOND).max(MIN_DURATION_SECS)
    }
}

impl Clone for MockSynthesizer {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            scripted_durations: self.scripted_durations.clone(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(
        &self,
        voice_id: &str,
        markup: &str,
    ) -> Result<SynthesizedVoice, SynthesisError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Working => Ok(SynthesizedVoice {
                payload: VoicePayload::Bytes(Bytes::copy_from_slice(markup.as_bytes())),
                duration_secs: self.duration_for(markup),
            }),

            MockBehavior::Failing => Err(SynthesisError::ApiError {
                status_code: 500,
                message: "Simulated synthesis failure".to_string(),
            }),

            MockBehavior::RateLimitedEvery { every } => {
                if every > 0 && count % every == every - 1 {
                    Err(SynthesisError::RateLimited(format!(
                        "Simulated rate limit (request #{})",
                        count + 1
                    )))
                } else {
                    Ok(SynthesizedVoice {
                        payload: VoicePayload::Bytes(Bytes::copy_from_slice(markup.as_bytes())),
                        duration_secs: self.duration_for(markup),
                    })
                }
            }

            MockBehavior::Unusable => Err(SynthesisError::Unusable {
                voice_id: voice_id.to_string(),
                reason: "simulated zero-length audio".to_string(),
            }),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(SynthesizedVoice {
                    payload: VoicePayload::Bytes(Bytes::copy_from_slice(markup.as_bytes())),
                    duration_secs: self.duration_for(markup),
                })
            }
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
