/*!
 * Timeline scrubbing.
 *
 * A drag is three phases: `begin` on pointer down, `update` per move and
 * `finish` on release. Begin requires full voice coverage so the duration
 * math has real audio lengths to work with; without it the call rejects
 * before touching playback or the stage. Moves are throttled to one render
 * per display frame, last write wins. Release snaps to the nearest part
 * start and renders once more, unthrottled.
 */

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;
use parking_lot::Mutex;

use crate::errors::PlaybackError;
use crate::playback::controller::PlaybackController;
use crate::playback::session::StageView;
use crate::render::{SceneFrame, SceneRenderer};
use crate::timeline::Timeline;
use crate::timing::{self, VoiceDurations};
use crate::voice::VoiceCache;

struct DragState {
    /// When the last throttled render went out
    last_render_at: Option<Instant>,
    /// Latest pointer time not yet rendered
    pending_secs: Option<f64>,
}

pub struct ScrubController {
    voices: Arc<VoiceCache>,
    renderer: Arc<dyn SceneRenderer>,
    playback: Arc<PlaybackController>,
    view: StageView,
    frame_interval: Duration,
    drag: Mutex<Option<DragState>>,
}

impl ScrubController {
    pub fn new(
        voices: Arc<VoiceCache>,
        renderer: Arc<dyn SceneRenderer>,
        playback: Arc<PlaybackController>,
        view: StageView,
        frame_ms: u64,
    ) -> Self {
        Self {
            voices,
            renderer,
            playback,
            view,
            frame_interval: Duration::from_millis(frame_ms),
            drag: Mutex::new(None),
        }
    }

    /// Pointer down. Stops any active playback, renders the grabbed position
    /// with its entry transition and opens the drag. Returns the playhead
    /// time the pointer landed on.
    ///
    /// Rejects with `CoverageMissing` before any state changes when some
    /// scene still lacks usable audio.
    pub fn begin(
        &self,
        timeline: &Timeline,
        ratio: f64,
        now: Instant,
    ) -> Result<f64, PlaybackError> {
        timeline.validate()?;
        if let Some(scene_index) = self.voices.first_coverage_gap(timeline) {
            return Err(PlaybackError::CoverageMissing { scene_index });
        }

        self.playback.stop();
        let secs = self.pointer_secs(timeline, ratio);
        debug!("Scrub begin at {:.3}s", secs);
        self.render_at(timeline, secs, false);
        *self.drag.lock() = Some(DragState {
            last_render_at: Some(now),
            pending_secs: None,
        });
        Ok(secs)
    }

    /// Pointer move. No-op unless a drag is open. Renders at most once per
    /// frame interval; a move arriving early is parked and superseded by
    /// the next one.
    pub fn update(
        &self,
        timeline: &Timeline,
        ratio: f64,
        now: Instant,
    ) -> Result<f64, PlaybackError> {
        let secs = self.pointer_secs(timeline, ratio);
        let mut drag = self.drag.lock();
        let Some(state) = drag.as_mut() else {
            return Ok(secs);
        };
        state.pending_secs = Some(secs);
        let due = match state.last_render_at {
            None => true,
            Some(at) => now.duration_since(at) >= self.frame_interval,
        };
        if due {
            let latest = state.pending_secs.take().unwrap_or(secs);
            state.last_render_at = Some(now);
            drop(drag);
            self.render_at(timeline, latest, true);
        }
        Ok(secs)
    }

    /// Pointer up. Closes the drag, snaps to the nearest part start and
    /// renders there without throttling. Playback stays stopped. Returns
    /// the snapped time.
    pub fn finish(&self, timeline: &Timeline, ratio: f64) -> Result<f64, PlaybackError> {
        timeline.validate()?;
        if let Some(scene_index) = self.voices.first_coverage_gap(timeline) {
            return Err(PlaybackError::CoverageMissing { scene_index });
        }

        *self.drag.lock() = None;
        let secs = self.pointer_secs(timeline, ratio);
        let durations: &dyn VoiceDurations = self.voices.as_ref();
        let snapped = timing::nearest_part_start(timeline, secs, durations);
        debug!("Scrub finish at {:.3}s, snapped to {:.3}s", secs, snapped);
        self.render_at(timeline, snapped, false);
        Ok(snapped)
    }

    /// True while a drag is open.
    pub fn dragging(&self) -> bool {
        self.drag.lock().is_some()
    }

    fn pointer_secs(&self, timeline: &Timeline, ratio: f64) -> f64 {
        let durations: &dyn VoiceDurations = self.voices.as_ref();
        let total = timing::total_duration(timeline, durations);
        timing::pointer_to_time(ratio, total)
    }

    fn render_at(&self, timeline: &Timeline, secs: f64, skip_animation: bool) {
        let durations: &dyn VoiceDurations = self.voices.as_ref();
        let scene_index = timing::scene_index_at_time(timeline, secs, durations);
        let part_index = timing::part_index_at_time(timeline, scene_index, secs, durations);
        let transition = if skip_animation {
            None
        } else {
            timeline.entry_transition_from(self.view.staged_scene(), scene_index)
        };
        if let Some(frame) =
            SceneFrame::for_part(timeline, scene_index, part_index, transition, skip_animation)
        {
            self.renderer.render(&frame);
            self.view.stage(scene_index, part_index, secs);
        }
    }
}
