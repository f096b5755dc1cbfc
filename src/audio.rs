/*!
 * Audio output seam.
 *
 * The engine hands opaque payloads to an output collaborator and suspends
 * on the returned handle until the clip ends, fails or is halted. Device
 * playback lives behind this trait in embedding applications; the
 * simulated output here backs the CLI preview with duration-accurate
 * timers.
 */

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::sync::watch;

use crate::errors::PlaybackError;
use crate::synth::VoicePayload;

/// How a playing clip finished
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceEnd {
    /// Clip played to its end, or was halted
    Ended,
    /// Clip failed mid-play
    Failed(String),
}

/// Handle to one playing clip
#[async_trait]
pub trait PlayingVoice: Send + Sync {
    /// Resolve when the clip finishes, fails or is halted.
    async fn until_ended(&self) -> VoiceEnd;

    /// Stop the clip immediately; waiters resolve.
    fn halt(&self);
}

/// Collaborator that turns payloads into sound
#[async_trait]
pub trait VoiceOutput: Send + Sync {
    /// Start playing a payload at the given rate.
    ///
    /// `duration_hint_secs` is the cached spoken length; device outputs
    /// that decode real lengths may ignore it.
    async fn start(
        &self,
        payload: &VoicePayload,
        duration_hint_secs: f64,
        rate: f64,
    ) -> Result<Arc<dyn PlayingVoice>, PlaybackError>;

    /// Fire a sound effect cue without tracking it.
    fn play_effect(&self, effect_ref: &str);
}

/// Timer-backed output for the CLI preview: clips "play" for exactly their
/// cached duration scaled by rate
#[derive(Debug, Default)]
pub struct SimulatedVoiceOutput;

#[async_trait]
impl VoiceOutput for SimulatedVoiceOutput {
    async fn start(
        &self,
        payload: &VoicePayload,
        duration_hint_secs: f64,
        rate: f64,
    ) -> Result<Arc<dyn PlayingVoice>, PlaybackError> {
        if payload.is_empty() {
            return Err(PlaybackError::Audio("cannot play an empty payload".to_string()));
        }

        let secs = (duration_hint_secs / rate.max(0.01)).max(0.0);
        debug!("Simulated voice start: {:.2}s at rate {:.2}", duration_hint_secs, rate);
        Ok(Arc::new(SimulatedVoice::new(Duration::from_secs_f64(secs))))
    }

    fn play_effect(&self, effect_ref: &str) {
        debug!("Sound effect cue: {}", effect_ref);
    }
}

struct SimulatedVoice {
    deadline: tokio::time::Instant,
    halted: watch::Sender<bool>,
}

impl SimulatedVoice {
    fn new(duration: Duration) -> Self {
        let (halted, _rx) = watch::channel(false);
        Self {
            deadline: tokio::time::Instant::now() + duration,
            halted,
        }
    }
}

#[async_trait]
impl PlayingVoice for SimulatedVoice {
    async fn until_ended(&self) -> VoiceEnd {
        let mut rx = self.halted.subscribe();
        let halted = async move {
            while !*rx.borrow_and_update() {
                if rx.changed().await.is_err() {
                    break;
                }
            }
        };

        tokio::select! {
            _ = tokio::time::sleep_until(self.deadline) => VoiceEnd::Ended,
            _ = halted => VoiceEnd::Ended,
        }
    }

    fn halt(&self) {
        self.halted.send_replace(true);
    }
}
