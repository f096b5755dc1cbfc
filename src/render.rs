/*!
 * Scene rendering seam.
 *
 * The engine never draws anything itself; it hands fully-resolved frames to
 * a renderer collaborator. A frame always carries image and subtitle
 * together so the stage swaps atomically, and the two-phase prepare/commit
 * split lets implementations stage assets at zero visibility before a
 * transition runs.
 */

use log::{debug, info};
use serde_json::Value;

use crate::timeline::{Timeline, Transition};

/// Everything a renderer needs to draw one part
#[derive(Debug, Clone, PartialEq)]
pub struct SceneFrame {
    /// Scene being shown
    pub scene_index: usize,
    /// Part within the scene
    pub part_index: usize,
    /// Resolved subtitle markup; empty for image-only scenes
    pub subtitle: String,
    /// Opaque image reference
    pub image: String,
    /// Opaque image transform payload
    pub image_transform: Value,
    /// Opaque text transform payload
    pub text_transform: Value,
    /// Entry transition to run, when one applies
    pub transition: Option<(Transition, f64)>,
    /// Whether animations should be skipped (scrub drags)
    pub skip_animation: bool,
}

impl SceneFrame {
    /// Build the frame for one part of a timeline scene.
    pub fn for_part(
        timeline: &Timeline,
        scene_index: usize,
        part_index: usize,
        transition: Option<(Transition, f64)>,
        skip_animation: bool,
    ) -> Option<Self> {
        let scene = timeline.scenes.get(scene_index)?;
        let parts = timeline.scene_parts(scene_index);
        let subtitle = parts.get(part_index).cloned().unwrap_or_default();

        Some(Self {
            scene_index,
            part_index,
            subtitle,
            image: scene.image.clone(),
            image_transform: scene.image_transform.clone(),
            text_transform: scene.text_transform.clone(),
            transition,
            skip_animation,
        })
    }
}

/// Collaborator that puts frames on the stage
///
/// Calls are synchronous fire-and-forget: the engine paces itself with
/// audio and timers, never by waiting for paint completion.
pub trait SceneRenderer: Send + Sync {
    /// Stage a frame at zero visibility so assets load without flashing.
    fn prepare(&self, frame: &SceneFrame);

    /// Make the staged frame visible, running its transition if any.
    fn commit(&self, frame: &SceneFrame);

    /// Prepare and commit in one step.
    fn render(&self, frame: &SceneFrame) {
        self.prepare(frame);
        self.commit(frame);
    }
}

/// Renderer used by the CLI preview: frames become log lines
#[derive(Debug, Default)]
pub struct ConsoleRenderer;

impl SceneRenderer for ConsoleRenderer {
    fn prepare(&self, frame: &SceneFrame) {
        debug!(
            "Staging scene {} part {} (image '{}')",
            frame.scene_index, frame.part_index, frame.image
        );
    }

    fn commit(&self, frame: &SceneFrame) {
        let effect = match frame.transition {
            Some((kind, secs)) if !frame.skip_animation => format!(" [{} {:.2}s]", kind, secs),
            _ => String::new(),
        };
        info!(
            "Scene {}.{}{} | {}",
            frame.scene_index + 1,
            frame.part_index + 1,
            effect,
            if frame.subtitle.is_empty() { "(no text)" } else { &frame.subtitle }
        );
    }
}
