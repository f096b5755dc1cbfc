/*!
 * Timeline and scene model.
 *
 * A timeline is an immutable, ordered list of scenes. Scenes carry their
 * authored duration, an entry transition, text that splits into parts, an
 * optional voice override and opaque visual payloads that flow through to
 * the renderer untouched. Mutating a timeline means swapping in a new value;
 * an active playback session always observes a consistent document.
 */

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::PlaybackError;
use crate::markup;

// @module: Timeline document model

/// Visual effect played when a scene enters the stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Transition {
    /// Hard cut, no effect
    #[default]
    None,
    /// Cross-fade from the previous scene
    Fade,
    SlideLeft,
    SlideRight,
    SlideUp,
    SlideDown,
    ZoomIn,
    ZoomOut,
    Rotate,
}

impl Transition {
    // @returns: Lowercase identifier matching the document format
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::None => "none",
            Transition::Fade => "fade",
            Transition::SlideLeft => "slide-left",
            Transition::SlideRight => "slide-right",
            Transition::SlideUp => "slide-up",
            Transition::SlideDown => "slide-down",
            Transition::ZoomIn => "zoom-in",
            Transition::ZoomOut => "zoom-out",
            Transition::Rotate => "rotate",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Single scene on the timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Group the scene belongs to; consecutive scenes sharing a group
    /// render as one visual unit and skip entry transitions between them
    #[serde(default)]
    pub group_id: u32,

    /// Authored display duration in seconds
    pub duration_secs: f64,

    /// Entry transition effect
    #[serde(default)]
    pub transition: Transition,

    /// Entry transition duration in seconds
    #[serde(default)]
    pub transition_secs: f64,

    /// Scene text; the timeline's part delimiter splits it into parts
    #[serde(default)]
    pub text: String,

    /// Authored per-part timings in seconds, overriding derived ones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_durations: Option<Vec<f64>>,

    /// Voice override for this scene; falls back to the timeline default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,

    /// Opaque sound effect reference, cued when the scene's first part shows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_effect: Option<String>,

    /// Opaque image reference handed to the renderer
    #[serde(default)]
    pub image: String,

    /// Opaque image transform payload, passed through untouched
    #[serde(default)]
    pub image_transform: Value,

    /// Opaque text transform payload, passed through untouched
    #[serde(default)]
    pub text_transform: Value,
}

impl Scene {
    /// Resolved part markups for this scene given a delimiter.
    /// Always yields at least one part.
    pub fn parts(&self, delimiter: &str) -> Vec<String> {
        markup::split_parts(&self.text, delimiter)
    }
}

/// Immutable timeline document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
    /// Ordered scenes
    pub scenes: Vec<Scene>,

    /// Voice used by scenes without an explicit override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_voice: Option<String>,

    /// Delimiter that splits scene text into parts
    #[serde(default = "default_part_delimiter")]
    pub part_delimiter: String,
}

fn default_part_delimiter() -> String {
    "|".to_string()
}

impl Timeline {
    /// Parse a timeline document from JSON, without validating it.
    pub fn from_json_str(json: &str) -> Result<Self, PlaybackError> {
        serde_json::from_str(json)
            .map_err(|e| PlaybackError::InvalidTimeline(format!("JSON parse error: {}", e)))
    }

    /// Serialize the timeline document to pretty JSON.
    pub fn to_json_string(&self) -> Result<String, PlaybackError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| PlaybackError::InvalidTimeline(format!("JSON encode error: {}", e)))
    }

    /// Validate the document structure.
    ///
    /// Checks that the timeline is non-empty, every duration is finite and
    /// positive, transition durations are finite and non-negative, and
    /// authored per-part timings (when present) are positive and match the
    /// part count.
    pub fn validate(&self) -> Result<(), PlaybackError> {
        if self.scenes.is_empty() {
            return Err(PlaybackError::InvalidTimeline("timeline has no scenes".to_string()));
        }

        for (index, scene) in self.scenes.iter().enumerate() {
            if !scene.duration_secs.is_finite() || scene.duration_secs <= 0.0 {
                return Err(PlaybackError::InvalidTimeline(format!(
                    "scene {} has invalid duration {}",
                    index, scene.duration_secs
                )));
            }

            if !scene.transition_secs.is_finite() || scene.transition_secs < 0.0 {
                return Err(PlaybackError::InvalidTimeline(format!(
                    "scene {} has invalid transition duration {}",
                    index, scene.transition_secs
                )));
            }

            if let Some(durations) = &scene.part_durations {
                let part_count = scene.parts(&self.part_delimiter).len();
                if durations.len() != part_count {
                    return Err(PlaybackError::InvalidTimeline(format!(
                        "scene {} has {} part timings for {} parts",
                        index,
                        durations.len(),
                        part_count
                    )));
                }
                if durations.iter().any(|d| !d.is_finite() || *d <= 0.0) {
                    return Err(PlaybackError::InvalidTimeline(format!(
                        "scene {} has a non-positive part timing",
                        index
                    )));
                }
            }
        }

        Ok(())
    }

    /// Number of scenes.
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    /// Whether the timeline has no scenes.
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Resolved part markups for a scene.
    pub fn scene_parts(&self, scene_index: usize) -> Vec<String> {
        self.scenes
            .get(scene_index)
            .map(|scene| scene.parts(&self.part_delimiter))
            .unwrap_or_default()
    }

    /// Total part count across all scenes.
    pub fn total_parts(&self) -> usize {
        (0..self.scenes.len()).map(|i| self.scene_parts(i).len()).sum()
    }

    /// Voice a scene speaks with: its own override, else the timeline
    /// default. Empty strings count as unset.
    pub fn resolved_voice(&self, scene_index: usize) -> Option<&str> {
        let scene = self.scenes.get(scene_index)?;
        scene
            .voice_id
            .as_deref()
            .filter(|v| !v.is_empty())
            .or(self.default_voice.as_deref().filter(|v| !v.is_empty()))
    }

    /// Whether a scene shares its group with the scene immediately before
    /// it on the timeline. The first scene never does.
    pub fn same_group_as_previous(&self, scene_index: usize) -> bool {
        if scene_index == 0 || scene_index >= self.scenes.len() {
            return false;
        }
        self.scenes[scene_index].group_id == self.scenes[scene_index - 1].group_id
    }

    /// Entry transition for `target` given the scene currently on stage.
    ///
    /// Returns `None` when the scene has no effect, a zero-length effect,
    /// or the staged scene shares its group. This is the single place the
    /// suppression rule lives; playback, scrubbing and navigation all call
    /// through here.
    pub fn entry_transition_from(
        &self,
        staged: Option<usize>,
        target: usize,
    ) -> Option<(Transition, f64)> {
        let scene = self.scenes.get(target)?;
        if scene.transition == Transition::None || scene.transition_secs <= 0.0 {
            return None;
        }
        if let Some(prev) = staged {
            if let Some(prev_scene) = self.scenes.get(prev) {
                if prev_scene.group_id == scene.group_id {
                    return None;
                }
            }
        }
        Some((scene.transition, scene.transition_secs))
    }

    /// First contiguous run of scenes carrying `group_id`, as an inclusive
    /// index range.
    pub fn group_run(&self, group_id: u32) -> Option<(usize, usize)> {
        let start = self.scenes.iter().position(|s| s.group_id == group_id)?;
        let mut end = start;
        while end + 1 < self.scenes.len() && self.scenes[end + 1].group_id == group_id {
            end += 1;
        }
        Some((start, end))
    }
}
