/*!
 * Timing calculator.
 *
 * Pure functions mapping a timeline plus a duration source to absolute
 * scene windows, part start offsets and total duration. Every derived
 * quantity is computed from the same per-part duration vector, so playback
 * timers, scrub positions and window boundaries can never disagree.
 *
 * Windows are half-open `[start, end)`: a boundary instant belongs to the
 * scene that starts there. A scene's entry transition time sits at the
 * front of its own window and is attributed to part 0.
 */

use crate::timeline::Timeline;

/// Read-side view of cached audio lengths.
///
/// The voice cache implements this with usable entries only; tests provide
/// a map-backed fake. Timing stays pure either way.
pub trait VoiceDurations {
    /// Cached duration in seconds for one part markup spoken by `voice_id`,
    /// or `None` when no usable audio exists.
    fn part_duration(&self, voice_id: &str, markup: &str) -> Option<f64>;
}

/// Duration source with no cached audio; timing falls back to authored
/// durations everywhere.
pub struct NoVoices;

impl VoiceDurations for NoVoices {
    fn part_duration(&self, _voice_id: &str, _markup: &str) -> Option<f64> {
        None
    }
}

/// Absolute time window a scene occupies on the timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneWindow {
    /// Scene the window belongs to
    pub scene_index: usize,
    /// Inclusive start in seconds
    pub start: f64,
    /// Entry transition length at the front of the window; zero when the
    /// scene shares its group with the previous scene
    pub entry_secs: f64,
    /// Exclusive end in seconds
    pub end: f64,
}

impl SceneWindow {
    /// Window length in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether the window contains `t` (half-open).
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }
}

/// Entry transition seconds counted in a scene's window, using the
/// timeline-order predecessor for the suppression rule.
fn entry_secs(timeline: &Timeline, scene_index: usize) -> f64 {
    let staged = if scene_index == 0 { None } else { Some(scene_index - 1) };
    timeline
        .entry_transition_from(staged, scene_index)
        .map(|(_, secs)| secs)
        .unwrap_or(0.0)
}

/// Effective per-part durations for a scene, in seconds.
///
/// Priority: authored per-part timings, else cached audio durations when
/// every part of a voiced scene has usable audio, else an equal split of
/// the authored scene duration. The choice is all-or-nothing per scene so
/// part boundaries always sum to the scene's effective duration.
pub fn part_durations(
    timeline: &Timeline,
    scene_index: usize,
    durations: &dyn VoiceDurations,
) -> Vec<f64> {
    let Some(scene) = timeline.scenes.get(scene_index) else {
        return Vec::new();
    };
    let parts = timeline.scene_parts(scene_index);

    if let Some(authored) = &scene.part_durations {
        if authored.len() == parts.len() {
            return authored.clone();
        }
    }

    if let Some(voice) = timeline.resolved_voice(scene_index) {
        let cached: Option<Vec<f64>> = parts
            .iter()
            .map(|markup| {
                if markup.is_empty() {
                    None
                } else {
                    durations.part_duration(voice, markup)
                }
            })
            .collect();
        if let Some(cached) = cached {
            return cached;
        }
    }

    let share = scene.duration_secs / parts.len() as f64;
    vec![share; parts.len()]
}

/// Effective display duration of one scene, excluding its entry transition.
pub fn scene_effective_duration(
    timeline: &Timeline,
    scene_index: usize,
    durations: &dyn VoiceDurations,
) -> f64 {
    part_durations(timeline, scene_index, durations).iter().sum()
}

/// Absolute windows for every scene, in timeline order.
pub fn scene_windows(timeline: &Timeline, durations: &dyn VoiceDurations) -> Vec<SceneWindow> {
    let mut windows = Vec::with_capacity(timeline.len());
    let mut cursor = 0.0;

    for scene_index in 0..timeline.len() {
        let entry = entry_secs(timeline, scene_index);
        let body = scene_effective_duration(timeline, scene_index, durations);
        let end = cursor + entry + body;
        windows.push(SceneWindow {
            scene_index,
            start: cursor,
            entry_secs: entry,
            end,
        });
        cursor = end;
    }

    windows
}

/// Total timeline duration in seconds. Zero for an empty timeline.
pub fn total_duration(timeline: &Timeline, durations: &dyn VoiceDurations) -> f64 {
    scene_windows(timeline, durations)
        .last()
        .map(|w| w.end)
        .unwrap_or(0.0)
}

/// Scene whose window contains `t`.
///
/// Negative times resolve to the first scene, times at or past the end to
/// the last. Callers validate the timeline first; an empty timeline is
/// debug-asserted and answered with scene 0.
pub fn scene_index_at_time(timeline: &Timeline, t: f64, durations: &dyn VoiceDurations) -> usize {
    debug_assert!(!timeline.is_empty(), "scene_index_at_time on empty timeline");
    if timeline.is_empty() {
        return 0;
    }
    if t < 0.0 {
        return 0;
    }

    for window in scene_windows(timeline, durations) {
        if t < window.end {
            return window.scene_index;
        }
    }

    timeline.len() - 1
}

/// Start offsets of a scene's parts, relative to the scene window start.
///
/// Part 0 starts at 0.0 so the entry transition plays inside its window;
/// part k >= 1 starts at `entry + sum(part_durations[..k])`.
pub fn part_start_times(
    timeline: &Timeline,
    scene_index: usize,
    durations: &dyn VoiceDurations,
) -> Vec<f64> {
    let durs = part_durations(timeline, scene_index, durations);
    if durs.is_empty() {
        return Vec::new();
    }

    let mut starts = Vec::with_capacity(durs.len());
    starts.push(0.0);
    let mut acc = entry_secs(timeline, scene_index);
    for d in &durs[..durs.len() - 1] {
        acc += d;
        starts.push(acc);
    }
    starts
}

/// Part whose window contains the absolute time `t` within a scene.
pub fn part_index_at_time(
    timeline: &Timeline,
    scene_index: usize,
    t: f64,
    durations: &dyn VoiceDurations,
) -> usize {
    let windows = scene_windows(timeline, durations);
    let Some(window) = windows.get(scene_index) else {
        return 0;
    };
    let rel = t - window.start;
    part_start_times(timeline, scene_index, durations)
        .iter()
        .rposition(|start| *start <= rel)
        .unwrap_or(0)
}

/// Absolute start time of the part whose window contains `t`.
///
/// `t` is clamped into the timeline first. Idempotent: snapping an already
/// snapped time returns it unchanged.
pub fn nearest_part_start(timeline: &Timeline, t: f64, durations: &dyn VoiceDurations) -> f64 {
    if timeline.is_empty() {
        return 0.0;
    }

    let total = total_duration(timeline, durations);
    let t = t.clamp(0.0, total);
    let scene_index = scene_index_at_time(timeline, t, durations);
    let windows = scene_windows(timeline, durations);
    let window = &windows[scene_index];
    let part_index = part_index_at_time(timeline, scene_index, t, durations);
    let starts = part_start_times(timeline, scene_index, durations);

    window.start + starts.get(part_index).copied().unwrap_or(0.0)
}

/// Map a scrubber pointer ratio onto the timeline.
///
/// The product is clamped to `[0, total]` and rounded to millisecond
/// precision, clamping winning over rounding at the edges.
pub fn pointer_to_time(ratio: f64, total: f64) -> f64 {
    if !ratio.is_finite() || !total.is_finite() || total <= 0.0 {
        return 0.0;
    }
    round_ms((ratio * total).clamp(0.0, total)).clamp(0.0, total)
}

/// Round seconds to millisecond precision.
pub fn round_ms(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}
