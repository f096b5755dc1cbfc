/*!
 * Playback engine: the state machine, scrubbing and direct navigation.
 *
 * The controller owns sessions and their cancellation; the scrubber and
 * navigator render directly and only touch playback to stop it. All three
 * share one [`StageView`](session::StageView) so the suppression rule for
 * entry transitions always sees what is really on screen.
 */

pub mod controller;
pub mod navigator;
pub mod scrub;
pub mod session;

pub use controller::PlaybackController;
pub use navigator::SceneNavigator;
pub use scrub::ScrubController;
pub use session::{PlaybackSession, StageView, ViewState};

/// How much of the timeline a play call covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayScope {
    /// Every scene, start to finish
    Timeline,
    /// One scene only
    Scene(usize),
    /// The first contiguous run of scenes with this group id
    Group(u32),
}

/// Observable machine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerState {
    #[default]
    Idle,
    /// Filling voice coverage before the first frame
    Preparing,
    Playing {
        scene_index: usize,
        part_index: usize,
    },
    /// Between scenes
    Advancing,
    Stopped,
    Completed,
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Ran to the end of its scope
    Completed,
    /// Interrupted by `stop()`
    Stopped,
}

/// Callbacks fired as playback progresses. All calls happen after the
/// session token was checked, so none arrive once `stop()` was observed.
pub trait PlaybackObserver: Send + Sync {
    fn on_scene_entered(&self, _scene_index: usize) {}
    fn on_part_started(&self, _scene_index: usize, _part_index: usize) {}
    fn on_completed(&self) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl PlaybackObserver for NullObserver {}
