/*!
 * Direct scene and part selection.
 *
 * Selection renders immediately without starting a playback session. Group
 * follow is the one timed behavior here: after landing on a scene whose
 * contiguous successors share its group, it steps through them on a dwell
 * timer so the whole beat can be previewed with one click.
 */

use std::sync::Arc;
use std::time::Duration;

use log::debug;

use crate::cancellation::CancellationToken;
use crate::errors::PlaybackError;
use crate::playback::session::StageView;
use crate::render::{SceneFrame, SceneRenderer};
use crate::timeline::{Timeline, Transition};
use crate::timing::{self, VoiceDurations};
use crate::voice::VoiceCache;

pub struct SceneNavigator {
    voices: Arc<VoiceCache>,
    renderer: Arc<dyn SceneRenderer>,
    view: StageView,
    /// Dwell per followed scene when no cached audio length is resolvable
    dwell_fallback_secs: f64,
    speed: f64,
}

impl SceneNavigator {
    pub fn new(
        voices: Arc<VoiceCache>,
        renderer: Arc<dyn SceneRenderer>,
        view: StageView,
        dwell_fallback_secs: f64,
        speed: f64,
    ) -> Self {
        Self {
            voices,
            renderer,
            view,
            dwell_fallback_secs: if dwell_fallback_secs.is_finite() && dwell_fallback_secs > 0.0 {
                dwell_fallback_secs
            } else {
                1.0
            },
            speed: if speed.is_finite() && speed > 0.0 { speed } else { 1.0 },
        }
    }

    /// Render a scene's first part and move the playhead to its window
    /// start. The entry transition runs unless the staged scene already
    /// belongs to the same group. Returns the new playhead time.
    pub fn select_scene(
        &self,
        timeline: &Timeline,
        scene_index: usize,
    ) -> Result<f64, PlaybackError> {
        let (start, _) = self.stage_scene(timeline, scene_index, 0)?;
        Ok(start)
    }

    /// Like `select_scene`, but when the following scenes continue the same
    /// group it walks them one by one, dwelling on each for its cached audio
    /// length (or the configured fallback). The walk aborts as soon as the
    /// token is observed cancelled; the scene staged last stays on screen.
    pub async fn select_scene_with_group_follow(
        &self,
        timeline: &Timeline,
        scene_index: usize,
        token: &CancellationToken,
    ) -> Result<f64, PlaybackError> {
        let (start, transition) = self.stage_scene(timeline, scene_index, 0)?;
        if let Some((_, secs)) = transition {
            if self.wait_or_cancelled(secs, token).await {
                return Ok(start);
            }
        }

        let mut current = scene_index;
        loop {
            let next = current + 1;
            if next >= timeline.len()
                || timeline.scenes[next].group_id != timeline.scenes[current].group_id
            {
                break;
            }
            let dwell = self
                .voices
                .cached_scene_duration(timeline, current)
                .unwrap_or(self.dwell_fallback_secs);
            if self.wait_or_cancelled(dwell, token).await {
                debug!("Group follow cancelled at scene {}", current);
                break;
            }
            // Same group, so the stage swap is transition-free by rule
            self.stage_scene(timeline, next, 0)?;
            current = next;
        }
        Ok(start)
    }

    /// Swap the subtitle to another part of the staged scene. When the scene
    /// is not the staged one this behaves like `select_scene` aimed at the
    /// requested part. Returns the part's playhead time.
    pub fn select_part(
        &self,
        timeline: &Timeline,
        scene_index: usize,
        part_index: usize,
    ) -> Result<f64, PlaybackError> {
        let parts = timeline.scene_parts(scene_index);
        if scene_index >= timeline.len() || part_index >= parts.len() {
            return Err(PlaybackError::InvalidTimeline(format!(
                "scene {} part {} out of range",
                scene_index, part_index
            )));
        }

        if self.view.staged_scene() == Some(scene_index) {
            // Subtitle-only swap: same image, no transition
            let frame = SceneFrame::for_part(timeline, scene_index, part_index, None, true)
                .ok_or_else(|| {
                    PlaybackError::InvalidTimeline(format!("scene {} missing", scene_index))
                })?;
            self.renderer.render(&frame);
            let offset = self.part_offset(timeline, scene_index, part_index);
            self.view.stage(scene_index, part_index, offset);
            Ok(offset)
        } else {
            self.stage_scene(timeline, scene_index, part_index)?;
            Ok(self.part_offset(timeline, scene_index, part_index))
        }
    }

    /// Render a scene part with the staged-aware entry transition and update
    /// the view. Returns the scene's window start and the transition used.
    fn stage_scene(
        &self,
        timeline: &Timeline,
        scene_index: usize,
        part_index: usize,
    ) -> Result<(f64, Option<(Transition, f64)>), PlaybackError> {
        if scene_index >= timeline.len() {
            return Err(PlaybackError::InvalidTimeline(format!(
                "scene index {} out of range ({} scenes)",
                scene_index,
                timeline.len()
            )));
        }
        let transition = timeline.entry_transition_from(self.view.staged_scene(), scene_index);
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
        let offset = self.part_offset(timeline, scene_index, part_index);
        self.view.stage(scene_index, part_index, offset);
        debug!("Selected scene {} part {}", scene_index, part_index);
        Ok((self.window_start(timeline, scene_index), transition))
    }

    fn window_start(&self, timeline: &Timeline, scene_index: usize) -> f64 {
        let durations: &dyn VoiceDurations = self.voices.as_ref();
        timing::scene_windows(timeline, durations)[scene_index].start
    }

    fn part_offset(&self, timeline: &Timeline, scene_index: usize, part_index: usize) -> f64 {
        let durations: &dyn VoiceDurations = self.voices.as_ref();
        let starts = timing::part_start_times(timeline, scene_index, durations);
        self.window_start(timeline, scene_index) + starts[part_index]
    }

    /// Sleep `secs` scaled by speed, racing the token. True when cancelled.
    async fn wait_or_cancelled(&self, secs: f64, token: &CancellationToken) -> bool {
        if token.is_cancelled() {
            return true;
        }
        let scaled = (secs / self.speed).max(0.0);
        if scaled <= 0.0 {
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs_f64(scaled)) => token.is_cancelled(),
            _ = token.cancelled() => true,
        }
    }
}
