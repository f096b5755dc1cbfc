/*!
 * Playback state machine.
 *
 * `play()` drives one session from Preparing to Completed: it fills voice
 * coverage for the scoped scenes, resolves the start position, then walks
 * parts one at a time. Each part renders atomically (image and subtitle in
 * one frame), then suspends on its audio clip or, for voiceless scenes, on
 * a timer. Every suspension races the session token so `stop()` from any
 * task wins immediately and no observer call fires afterwards.
 */

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::audio::{VoiceEnd, VoiceOutput};
use crate::cancellation::CancellationToken;
use crate::errors::PlaybackError;
use crate::playback::session::{PlaybackSession, StageView};
use crate::playback::{PlayOutcome, PlayScope, PlaybackObserver, PlayerState};
use crate::render::{SceneFrame, SceneRenderer};
use crate::timeline::Timeline;
use crate::timing::{self, VoiceDurations};
use crate::voice::VoiceCache;

// @struct: PlaybackController
// Owns the active session slot; collaborators are injected so tests can
// substitute recording fakes for the renderer and the audio output.
pub struct PlaybackController {
    voices: Arc<VoiceCache>,
    renderer: Arc<dyn SceneRenderer>,
    output: Arc<dyn VoiceOutput>,
    observer: Arc<dyn PlaybackObserver>,
    view: StageView,
    state: Mutex<PlayerState>,
    active: Mutex<Option<Arc<PlaybackSession>>>,
    speed: f64,
}

impl PlaybackController {
    pub fn new(
        voices: Arc<VoiceCache>,
        renderer: Arc<dyn SceneRenderer>,
        output: Arc<dyn VoiceOutput>,
        observer: Arc<dyn PlaybackObserver>,
        view: StageView,
        speed: f64,
    ) -> Self {
        Self {
            voices,
            renderer,
            output,
            observer,
            view,
            state: Mutex::new(PlayerState::Idle),
            active: Mutex::new(None),
            speed: if speed.is_finite() && speed > 0.0 { speed } else { 1.0 },
        }
    }

    /// Current machine state.
    pub fn state(&self) -> PlayerState {
        *self.state.lock()
    }

    /// Shared stage view.
    pub fn view(&self) -> &StageView {
        &self.view
    }

    fn set_state(&self, state: PlayerState) {
        *self.state.lock() = state;
    }

    /// Stop the active session, if any. Safe to call from any task and at
    /// any time; a session that already finished is a no-op.
    pub fn stop(&self) {
        let session = self.active.lock().clone();
        if let Some(session) = session {
            info!("Session {} stop requested", session.short_id());
            session.stop();
            self.set_state(PlayerState::Stopped);
        }
    }

    /// Play the timeline from `start_offset` seconds, constrained to `scope`.
    ///
    /// A play call while another session is active stops the old session
    /// first. Returns `Completed` when the scoped range ran to its end and
    /// `Stopped` when `stop()` interrupted it.
    pub async fn play(
        &self,
        timeline: &Timeline,
        start_offset: f64,
        scope: PlayScope,
    ) -> Result<PlayOutcome, PlaybackError> {
        timeline.validate()?;

        let session = PlaybackSession::new(scope);
        {
            let mut active = self.active.lock();
            if let Some(previous) = active.replace(session.clone()) {
                debug!(
                    "Session {} superseded by {}",
                    previous.short_id(),
                    session.short_id()
                );
                previous.stop();
            }
        }
        self.set_state(PlayerState::Preparing);
        info!(
            "Session {} preparing ({:?}, offset {:.3}s)",
            session.short_id(),
            scope,
            start_offset
        );

        let result = self.run_session(timeline, start_offset, &session).await;

        let ours = {
            let mut active = self.active.lock();
            let ours = active
                .as_ref()
                .map(|current| Arc::ptr_eq(current, &session))
                .unwrap_or(false);
            if ours {
                *active = None;
            }
            ours
        };
        // A superseded session must not stomp the state its successor owns
        if ours {
            match &result {
                Ok(PlayOutcome::Completed) => self.set_state(PlayerState::Completed),
                Ok(PlayOutcome::Stopped) => self.set_state(PlayerState::Stopped),
                Err(_) => self.set_state(PlayerState::Idle),
            }
        }
        result
    }

    async fn run_session(
        &self,
        timeline: &Timeline,
        start_offset: f64,
        session: &Arc<PlaybackSession>,
    ) -> Result<PlayOutcome, PlaybackError> {
        let token = session.token();
        let (first, last) = scope_range(timeline, session.scope())?;

        // A stop during preparation is a stop, not a failure
        match self.prepare_coverage(timeline, first, last, token).await {
            Ok(()) => {}
            Err(PlaybackError::Cancelled) => return Ok(PlayOutcome::Stopped),
            Err(err) => return Err(err),
        }
        if token.is_cancelled() {
            return Ok(PlayOutcome::Stopped);
        }

        let durations: &dyn VoiceDurations = self.voices.as_ref();
        let total = timing::total_duration(timeline, durations);
        let offset = if start_offset.is_finite() {
            start_offset.clamp(0.0, total)
        } else {
            0.0
        };
        let mut scene_index = timing::scene_index_at_time(timeline, offset, durations);
        let mut part_index = if scene_index < first || scene_index > last {
            scene_index = first;
            0
        } else {
            timing::part_index_at_time(timeline, scene_index, offset, durations)
        };

        loop {
            if token.is_cancelled() {
                return Ok(PlayOutcome::Stopped);
            }
            self.observer.on_scene_entered(scene_index);

            let outcome = self
                .play_scene_parts(timeline, scene_index, part_index, session)
                .await?;
            if outcome == PlayOutcome::Stopped {
                return Ok(PlayOutcome::Stopped);
            }
            part_index = 0;

            if scene_index >= last {
                break;
            }
            self.set_state(PlayerState::Advancing);
            scene_index += 1;
        }

        if token.is_cancelled() {
            return Ok(PlayOutcome::Stopped);
        }
        info!("Session {} completed", session.short_id());
        self.observer.on_completed();
        Ok(PlayOutcome::Completed)
    }

    /// Fill voice coverage for every scoped scene that lacks it. Scenes run
    /// in parallel; the cache batches parts internally.
    async fn prepare_coverage(
        &self,
        timeline: &Timeline,
        first: usize,
        last: usize,
        token: &CancellationToken,
    ) -> Result<(), PlaybackError> {
        let uncovered: Vec<usize> = (first..=last)
            .filter(|&index| !self.voices.scene_covered(timeline, index))
            .collect();
        if uncovered.is_empty() {
            return Ok(());
        }
        debug!("Preparing {} uncovered scene(s)", uncovered.len());
        let results = futures::future::join_all(
            uncovered
                .iter()
                .map(|&index| self.voices.ensure_scene(timeline, index, token, false)),
        )
        .await;
        for result in results {
            result?;
        }
        Ok(())
    }

    /// Walk one scene's parts from `start_part`. Returns `Stopped` as soon
    /// as the token is observed cancelled, without touching the observer.
    async fn play_scene_parts(
        &self,
        timeline: &Timeline,
        scene_index: usize,
        start_part: usize,
        session: &Arc<PlaybackSession>,
    ) -> Result<PlayOutcome, PlaybackError> {
        let token = session.token();
        let durations: &dyn VoiceDurations = self.voices.as_ref();
        let windows = timing::scene_windows(timeline, durations);
        let window_start = windows[scene_index].start;
        let part_starts = timing::part_start_times(timeline, scene_index, durations);
        let part_durs = timing::part_durations(timeline, scene_index, durations);
        let parts = timeline.scene_parts(scene_index);
        let voice = timeline.resolved_voice(scene_index);
        let scene = &timeline.scenes[scene_index];

        for part_index in start_part..parts.len() {
            if token.is_cancelled() {
                return Ok(PlayOutcome::Stopped);
            }

            // Entry transition only on the first part, and only when the
            // staged scene belongs to a different group.
            let transition = if part_index == 0 {
                timeline.entry_transition_from(self.view.staged_scene(), scene_index)
            } else {
                None
            };
            let frame = SceneFrame::for_part(timeline, scene_index, part_index, transition, false)
                .ok_or_else(|| {
                    PlaybackError::InvalidTimeline(format!(
                        "scene {} part {} out of range",
                        scene_index, part_index
                    ))
                })?;
            if transition.is_some() {
                self.renderer.prepare(&frame);
                self.renderer.commit(&frame);
            } else {
                self.renderer.render(&frame);
            }
            self.view
                .stage(scene_index, part_index, window_start + part_starts[part_index]);
            self.set_state(PlayerState::Playing {
                scene_index,
                part_index,
            });

            // Fire-and-forget sound effect, once per scene entry
            if part_index == 0 {
                if let Some(effect) = &scene.sound_effect {
                    self.output.play_effect(effect);
                }
            }
            self.observer.on_part_started(scene_index, part_index);

            let markup = &parts[part_index];
            let entry = voice
                .filter(|_| !markup.is_empty())
                .and_then(|voice_id| self.voices.get(voice_id, markup));
            match entry {
                Some(entry) => {
                    if token.is_cancelled() {
                        return Ok(PlayOutcome::Stopped);
                    }
                    match self
                        .output
                        .start(&entry.payload, entry.duration_secs, self.speed)
                        .await
                    {
                        Ok(playing) => {
                            session.set_current_voice(playing.clone());
                            let end = tokio::select! {
                                end = playing.until_ended() => Some(end),
                                _ = token.cancelled() => None,
                            };
                            session.clear_current_voice();
                            match end {
                                Some(VoiceEnd::Ended) => {}
                                Some(VoiceEnd::Failed(reason)) => {
                                    warn!(
                                        "Audio failed on scene {} part {}: {}; treating part as ended",
                                        scene_index, part_index, reason
                                    );
                                }
                                None => playing.halt(),
                            }
                        }
                        Err(err) => {
                            warn!(
                                "Audio start failed on scene {} part {}: {}; treating part as ended",
                                scene_index, part_index, err
                            );
                        }
                    }
                }
                None => {
                    // Voiceless part: hold for its share of the scene window
                    let secs = (part_durs[part_index] / self.speed).max(0.0);
                    if secs > 0.0 {
                        tokio::select! {
                            _ = tokio::time::sleep(Duration::from_secs_f64(secs)) => {}
                            _ = token.cancelled() => {}
                        }
                    }
                }
            }

            if token.is_cancelled() {
                return Ok(PlayOutcome::Stopped);
            }
        }
        Ok(PlayOutcome::Completed)
    }
}

/// Inclusive scene range covered by a scope.
fn scope_range(timeline: &Timeline, scope: PlayScope) -> Result<(usize, usize), PlaybackError> {
    match scope {
        PlayScope::Timeline => Ok((0, timeline.len() - 1)),
        PlayScope::Scene(index) => {
            if index < timeline.len() {
                Ok((index, index))
            } else {
                Err(PlaybackError::InvalidTimeline(format!(
                    "scene index {} out of range ({} scenes)",
                    index,
                    timeline.len()
                )))
            }
        }
        PlayScope::Group(group_id) => timeline.group_run(group_id).ok_or_else(|| {
            PlaybackError::InvalidTimeline(format!("group {} has no scenes", group_id))
        }),
    }
}
