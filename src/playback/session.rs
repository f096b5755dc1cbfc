/*!
 * Session state shared across the playback machinery.
 *
 * A session binds one `play()` call to its cancellation token and the audio
 * handle currently sounding, so `stop()` can land from any task. The stage
 * view is the single record of what is on screen; the controller, scrubber
 * and navigator all read and write the same one.
 */

use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::audio::PlayingVoice;
use crate::cancellation::CancellationToken;
use crate::playback::PlayScope;

/// What is currently rendered
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewState {
    /// Scene and part on stage, if anything has rendered yet
    pub staged: Option<(usize, usize)>,
    /// Playhead position in seconds
    pub offset_secs: f64,
}

/// Shared, clonable handle to the view state
#[derive(Clone, Default)]
pub struct StageView {
    inner: Arc<Mutex<ViewState>>,
}

impl StageView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> ViewState {
        *self.inner.lock()
    }

    /// Scene currently on stage, if any.
    pub fn staged_scene(&self) -> Option<usize> {
        self.inner.lock().staged.map(|(scene, _)| scene)
    }

    /// Record a rendered part and the playhead position it belongs to.
    pub fn stage(&self, scene_index: usize, part_index: usize, offset_secs: f64) {
        let mut view = self.inner.lock();
        view.staged = Some((scene_index, part_index));
        view.offset_secs = offset_secs;
    }

    /// Move the playhead without touching what is staged.
    pub fn set_offset(&self, offset_secs: f64) {
        self.inner.lock().offset_secs = offset_secs;
    }
}

/// One play() call's identity, token and live audio slot
pub struct PlaybackSession {
    /// Short id for log correlation
    id: String,
    /// Scope the session was started with
    scope: PlayScope,
    /// Cancellation token observed by every suspension
    token: CancellationToken,
    /// Audio handle currently sounding, if any
    current_voice: Mutex<Option<Arc<dyn PlayingVoice>>>,
}

impl PlaybackSession {
    pub fn new(scope: PlayScope) -> Arc<Self> {
        let id = Uuid::new_v4().to_string()[..8].to_string();
        Arc::new(Self {
            id,
            scope,
            token: CancellationToken::new(),
            current_voice: Mutex::new(None),
        })
    }

    pub fn short_id(&self) -> &str {
        &self.id
    }

    pub fn scope(&self) -> PlayScope {
        self.scope
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Track the handle of the clip that just started.
    pub fn set_current_voice(&self, voice: Arc<dyn PlayingVoice>) {
        *self.current_voice.lock() = Some(voice);
    }

    /// Forget the current clip once its suspension resolved.
    pub fn clear_current_voice(&self) {
        *self.current_voice.lock() = None;
    }

    /// Cancel the token, then halt whatever is sounding. The order matters:
    /// a waiter woken by the halt must already observe the cancelled token.
    pub fn stop(&self) {
        debug!("Session {} stopping", self.id);
        self.token.cancel();
        if let Some(voice) = self.current_voice.lock().take() {
            voice.halt();
        }
    }
}
