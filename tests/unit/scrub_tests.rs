/*!
 * Tests for timeline scrubbing
 */

use std::sync::Arc;
use std::time::{Duration, Instant};

use scenecast::errors::PlaybackError;
use scenecast::playback::{
    NullObserver, PlayOutcome, PlayScope, PlaybackController, PlayerState, ScrubController,
    StageView,
};
use scenecast::synth::MockSynthesizer;
use scenecast::timeline::{Timeline, Transition};
use scenecast::voice::VoiceCache;

use crate::common;
use crate::common::mock_collaborators::{FakeVoiceOutput, RecordingRenderer};

struct Rig {
    scrub: ScrubController,
    playback: Arc<PlaybackController>,
    renderer: RecordingRenderer,
    view: StageView,
}

fn rig_with(cache: Arc<VoiceCache>, frame_ms: u64) -> Rig {
    let renderer = RecordingRenderer::new();
    let view = StageView::new();
    let playback = Arc::new(PlaybackController::new(
        Arc::clone(&cache),
        Arc::new(renderer.clone()),
        Arc::new(FakeVoiceOutput::auto()),
        Arc::new(NullObserver),
        view.clone(),
        1.0,
    ));
    let scrub = ScrubController::new(
        cache,
        Arc::new(renderer.clone()),
        Arc::clone(&playback),
        view.clone(),
        frame_ms,
    );
    Rig {
        scrub,
        playback,
        renderer,
        view,
    }
}

fn voiceless_rig() -> Rig {
    rig_with(common::cache_with(MockSynthesizer::working()), 16)
}

/// Two voiceless scenes of 2.0s each: windows [0,2) and [2,4)
fn two_scene_timeline() -> Timeline {
    common::timeline_of(vec![
        common::scene(1, 2.0, "a"),
        common::scene(2, 2.0, "b|c"),
    ])
}

#[test]
fn test_begin_withMissingCoverage_shouldRejectWithoutAnyMutation() {
    let rig = voiceless_rig();
    let timeline = common::voiced_timeline_of(vec![common::scene(1, 2.0, "Alpha.")], "narrator-a");

    let result = rig.scrub.begin(&timeline, 0.5, Instant::now());

    assert_eq!(result, Err(PlaybackError::CoverageMissing { scene_index: 0 }));
    assert_eq!(rig.renderer.committed_count(), 0);
    assert!(!rig.scrub.dragging());
    assert_eq!(rig.view.snapshot().staged, None);
}

#[test]
fn test_begin_shouldRenderTheGrabbedPositionWithItsTransition() {
    let rig = voiceless_rig();
    let timeline = common::timeline_of(vec![
        common::scene(1, 2.0, "a"),
        common::scene_with_transition(2, 2.0, "b", Transition::Fade, 0.5),
    ]);

    // Scene 1 carries a 0.5s entry transition, so the total is 4.5s
    let secs = rig.scrub.begin(&timeline, 0.75, Instant::now()).unwrap();

    assert_eq!(secs, 3.375);
    let frames = rig.renderer.committed();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].scene_index, 1);
    assert_eq!(frames[0].transition, Some((Transition::Fade, 0.5)));
    assert!(!frames[0].skip_animation);
    assert!(rig.scrub.dragging());
    assert_eq!(rig.view.snapshot().staged, Some((1, 0)));
}

#[tokio::test(start_paused = true)]
async fn test_begin_shouldStopActivePlayback() {
    let rig = voiceless_rig();
    let timeline = common::timeline_of(vec![common::scene(1, 10.0, "Long part")]);

    let playback = Arc::clone(&rig.playback);
    let task_timeline = timeline.clone();
    let handle =
        tokio::spawn(async move { playback.play(&task_timeline, 0.0, PlayScope::Timeline).await });
    for _ in 0..10_000 {
        if matches!(rig.playback.state(), PlayerState::Playing { .. }) {
            break;
        }
        tokio::task::yield_now().await;
    }

    rig.scrub.begin(&timeline, 0.0, Instant::now()).unwrap();

    let outcome = handle.await.unwrap().unwrap();
    assert_eq!(outcome, PlayOutcome::Stopped);
    assert_eq!(rig.playback.state(), PlayerState::Stopped);
    assert!(rig.scrub.dragging());
}

#[test]
fn test_update_beforeTheFrameInterval_shouldParkTheMove() {
    let rig = voiceless_rig();
    let timeline = two_scene_timeline();
    let t0 = Instant::now();

    rig.scrub.begin(&timeline, 0.0, t0).unwrap();
    let parked = rig.scrub.update(&timeline, 0.25, t0 + Duration::from_millis(5)).unwrap();

    // The time is still computed and returned, but nothing rendered
    assert_eq!(parked, 1.0);
    assert_eq!(rig.renderer.committed_count(), 1);
    assert_eq!(rig.view.snapshot().offset_secs, 0.0);
}

#[test]
fn test_update_afterTheFrameInterval_shouldRenderTheLatestMove() {
    let rig = voiceless_rig();
    let timeline = two_scene_timeline();
    let t0 = Instant::now();

    rig.scrub.begin(&timeline, 0.0, t0).unwrap();
    rig.scrub.update(&timeline, 0.25, t0 + Duration::from_millis(5)).unwrap();
    rig.scrub.update(&timeline, 0.5, t0 + Duration::from_millis(20)).unwrap();

    // The parked 1.0s position was superseded and never rendered
    let frames = rig.renderer.committed();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].scene_index, 0);
    assert_eq!(frames[1].scene_index, 1);
    assert!(frames[1].skip_animation);
    assert_eq!(frames[1].transition, None);
    assert_eq!(rig.view.snapshot().offset_secs, 2.0);
}

#[test]
fn test_update_duringDrag_shouldThrottleToOneRenderPerInterval() {
    let rig = voiceless_rig();
    let timeline = two_scene_timeline();
    let t0 = Instant::now();

    rig.scrub.begin(&timeline, 0.0, t0).unwrap();
    for ms in [2u64, 4, 6, 8, 10, 12, 14] {
        rig.scrub.update(&timeline, 0.1, t0 + Duration::from_millis(ms)).unwrap();
    }
    assert_eq!(rig.renderer.committed_count(), 1);

    rig.scrub.update(&timeline, 0.9, t0 + Duration::from_millis(16)).unwrap();
    assert_eq!(rig.renderer.committed_count(), 2);
}

#[test]
fn test_update_withoutAnOpenDrag_shouldBeANoOp() {
    let rig = voiceless_rig();
    let timeline = two_scene_timeline();

    let secs = rig.scrub.update(&timeline, 0.5, Instant::now()).unwrap();

    assert_eq!(secs, 2.0);
    assert_eq!(rig.renderer.committed_count(), 0);
    assert_eq!(rig.view.snapshot().staged, None);
}

#[test]
fn test_finish_shouldSnapToTheNearestPartStartAndCloseTheDrag() {
    let rig = voiceless_rig();
    let timeline = two_scene_timeline();
    let t0 = Instant::now();

    rig.scrub.begin(&timeline, 0.0, t0).unwrap();
    let snapped = rig.scrub.finish(&timeline, 0.8).unwrap();

    // 3.2s lands inside scene 1 part 1, which starts at 3.0s
    assert_eq!(snapped, 3.0);
    assert!(!rig.scrub.dragging());
    let frames = rig.renderer.committed();
    assert_eq!(frames.last().map(|f| (f.scene_index, f.part_index)), Some((1, 1)));
    assert!(!frames.last().map(|f| f.skip_animation).unwrap_or(true));
    assert_eq!(rig.view.snapshot().offset_secs, 3.0);
    assert_eq!(rig.playback.state(), PlayerState::Idle);
}

#[test]
fn test_finish_withMissingCoverage_shouldReject() {
    let rig = voiceless_rig();
    let timeline = common::voiced_timeline_of(vec![common::scene(1, 2.0, "Alpha.")], "narrator-a");

    let result = rig.scrub.finish(&timeline, 0.5);

    assert_eq!(result, Err(PlaybackError::CoverageMissing { scene_index: 0 }));
    assert_eq!(rig.renderer.committed_count(), 0);
}

#[tokio::test]
async fn test_begin_withCachedDurations_shouldMapThePointerOverTheEffectiveTotal() {
    let synth = MockSynthesizer::working()
        .with_duration_for("Alpha.", 2.0)
        .with_duration_for("Beta.", 2.0);
    let cache = common::cache_with(synth);
    let rig = rig_with(Arc::clone(&cache), 16);
    // Authored 10s, but cached audio makes the effective total 4s
    let timeline =
        common::voiced_timeline_of(vec![common::scene(1, 10.0, "Alpha.|Beta.")], "narrator-a");
    let token = scenecast::cancellation::CancellationToken::new();
    cache.ensure_timeline(&timeline, &token, false).await.unwrap();

    let secs = rig.scrub.begin(&timeline, 0.5, Instant::now()).unwrap();

    assert_eq!(secs, 2.0);
    let frames = rig.renderer.committed();
    assert_eq!(frames[0].part_index, 1);
    assert_eq!(frames[0].subtitle, "Beta.");
}

#[test]
fn test_scrubRoundTrip_shouldStaySnappedOnRepeatedFinish() {
    let rig = voiceless_rig();
    let timeline = two_scene_timeline();
    let t0 = Instant::now();

    rig.scrub.begin(&timeline, 0.8, t0).unwrap();
    let first = rig.scrub.finish(&timeline, 0.8).unwrap();

    rig.scrub.begin(&timeline, first / 4.0, t0 + Duration::from_millis(40)).unwrap();
    let second = rig.scrub.finish(&timeline, first / 4.0).unwrap();

    // Finishing at an already snapped position keeps it
    assert_eq!(first, 3.0);
    assert_eq!(second, 3.0);
}
