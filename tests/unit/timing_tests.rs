/*!
 * Tests for the timing calculator
 */

use bytes::Bytes;
use rand::Rng;
use scenecast::synth::VoicePayload;
use scenecast::timeline::{Timeline, Transition};
use scenecast::timing::{
    self, NoVoices, VoiceDurations,
};
use scenecast::voice::{VoiceEntry, VoiceStore};

use crate::common;

fn seeded_store(voice: &str, entries: &[(&str, f64)]) -> VoiceStore {
    let store = VoiceStore::new();
    for (markup, duration) in entries {
        store.insert(
            voice,
            markup,
            VoiceEntry {
                payload: VoicePayload::Bytes(Bytes::from_static(b"pcm")),
                duration_secs: *duration,
                markup: markup.to_string(),
            },
        );
    }
    store
}

/// Three scenes: a two-scene group followed by a group switch.
/// Windows with authored durations: [0, 2.5) [2.5, 5.5) [5.5, 6.75)
fn grouped_timeline() -> Timeline {
    common::timeline_of(vec![
        common::scene_with_transition(1, 2.0, "a", Transition::Fade, 0.5),
        common::scene_with_transition(1, 3.0, "b", Transition::SlideLeft, 0.4),
        common::scene_with_transition(2, 1.0, "c", Transition::ZoomIn, 0.25),
    ])
}

#[test]
fn test_sceneWindows_withSameGroupRun_shouldSuppressEntryInsideRun() {
    let timeline = grouped_timeline();
    let windows = timing::scene_windows(&timeline, &NoVoices);

    assert_eq!(windows.len(), 3);
    assert_eq!(windows[0].start, 0.0);
    assert_eq!(windows[0].entry_secs, 0.5);
    assert_eq!(windows[0].end, 2.5);

    // Scene 1 shares group 1 with its predecessor, so no entry time
    assert_eq!(windows[1].entry_secs, 0.0);
    assert_eq!(windows[1].start, 2.5);
    assert_eq!(windows[1].end, 5.5);

    assert_eq!(windows[2].entry_secs, 0.25);
    assert_eq!(windows[2].end, 6.75);
}

#[test]
fn test_totalDuration_shouldMatchLastWindowEnd() {
    let timeline = grouped_timeline();
    assert_eq!(timing::total_duration(&timeline, &NoVoices), 6.75);
}

#[test]
fn test_totalDuration_withEmptyTimeline_shouldBeZero() {
    let timeline = common::timeline_of(vec![]);
    assert_eq!(timing::total_duration(&timeline, &NoVoices), 0.0);
}

#[test]
fn test_partDurations_withNoCache_shouldSplitAuthoredEvenly() {
    let timeline = common::timeline_of(vec![common::scene(1, 3.0, "A.|B.|C.")]);
    let durs = timing::part_durations(&timeline, 0, &NoVoices);
    assert_eq!(durs, vec![1.0, 1.0, 1.0]);
}

#[test]
fn test_partDurations_withFullCache_shouldPreferCachedAudio() {
    let timeline = common::voiced_timeline_of(vec![common::scene(1, 4.0, "Alpha.|Beta.")], "narrator-a");
    let store = seeded_store("narrator-a", &[("Alpha.", 1.25), ("Beta.", 2.0)]);

    let durs = timing::part_durations(&timeline, 0, &store);
    assert_eq!(durs, vec![1.25, 2.0]);
    assert_eq!(timing::total_duration(&timeline, &store), 3.25);
}

#[test]
fn test_partDurations_withPartialCache_shouldFallBackToAuthored() {
    let timeline = common::voiced_timeline_of(vec![common::scene(1, 4.0, "Alpha.|Beta.")], "narrator-a");
    let store = seeded_store("narrator-a", &[("Alpha.", 1.25)]);

    // Cached timing is all-or-nothing per scene
    let durs = timing::part_durations(&timeline, 0, &store);
    assert_eq!(durs, vec![2.0, 2.0]);
}

#[test]
fn test_partDurations_withAuthoredTimings_shouldTakePriorityOverCache() {
    let mut scene = common::scene(1, 4.0, "Alpha.|Beta.");
    scene.part_durations = Some(vec![0.5, 1.5]);
    let timeline = common::voiced_timeline_of(vec![scene], "narrator-a");
    let store = seeded_store("narrator-a", &[("Alpha.", 1.25), ("Beta.", 2.0)]);

    let durs = timing::part_durations(&timeline, 0, &store);
    assert_eq!(durs, vec![0.5, 1.5]);
}

#[test]
fn test_partDurations_withBlankVoicedScene_shouldUseAuthoredDuration() {
    let timeline = common::voiced_timeline_of(vec![common::scene(1, 4.0, "")], "narrator-a");
    let store = seeded_store("narrator-a", &[("anything", 1.0)]);

    let durs = timing::part_durations(&timeline, 0, &store);
    assert_eq!(durs, vec![4.0]);
}

#[test]
fn test_sceneIndexAtTime_atWindowBoundary_shouldBelongToNextScene() {
    let timeline = grouped_timeline();

    assert_eq!(timing::scene_index_at_time(&timeline, 0.0, &NoVoices), 0);
    assert_eq!(timing::scene_index_at_time(&timeline, 2.499, &NoVoices), 0);
    assert_eq!(timing::scene_index_at_time(&timeline, 2.5, &NoVoices), 1);
    assert_eq!(timing::scene_index_at_time(&timeline, 5.5, &NoVoices), 2);
}

#[test]
fn test_sceneIndexAtTime_outsideTimeline_shouldClampToEnds() {
    let timeline = grouped_timeline();

    assert_eq!(timing::scene_index_at_time(&timeline, -1.0, &NoVoices), 0);
    assert_eq!(timing::scene_index_at_time(&timeline, 6.75, &NoVoices), 2);
    assert_eq!(timing::scene_index_at_time(&timeline, 100.0, &NoVoices), 2);
}

#[test]
fn test_partStartTimes_shouldPlaceEntryTimeBeforeSecondPart() {
    let timeline = common::timeline_of(vec![common::scene_with_transition(
        1,
        3.0,
        "A.|B.|C.",
        Transition::Fade,
        0.5,
    )]);

    // Part 0 owns the entry transition; later parts shift past it
    let starts = timing::part_start_times(&timeline, 0, &NoVoices);
    assert_eq!(starts, vec![0.0, 1.5, 2.5]);
}

#[test]
fn test_partIndexAtTime_duringEntryTransition_shouldBePartZero() {
    let timeline = common::timeline_of(vec![common::scene_with_transition(
        1,
        3.0,
        "A.|B.|C.",
        Transition::Fade,
        0.5,
    )]);

    assert_eq!(timing::part_index_at_time(&timeline, 0, 0.2, &NoVoices), 0);
    assert_eq!(timing::part_index_at_time(&timeline, 0, 1.5, &NoVoices), 1);
    assert_eq!(timing::part_index_at_time(&timeline, 0, 2.49, &NoVoices), 1);
    assert_eq!(timing::part_index_at_time(&timeline, 0, 2.5, &NoVoices), 2);
}

#[test]
fn test_nearestPartStart_shouldSnapBackToContainingPart() {
    let timeline = common::timeline_of(vec![common::scene(1, 3.0, "A.|B.|C.")]);

    assert_eq!(timing::nearest_part_start(&timeline, 1.5, &NoVoices), 1.0);
    assert_eq!(timing::nearest_part_start(&timeline, 0.999, &NoVoices), 0.0);
    assert_eq!(timing::nearest_part_start(&timeline, 2.7, &NoVoices), 2.0);
}

#[test]
fn test_nearestPartStart_shouldBeIdempotent() {
    let timeline = common::timeline_of(vec![
        common::scene(1, 2.0, "a"),
        common::scene(2, 2.0, "b|c"),
    ]);

    for t in [0.0, 0.7, 1.999, 2.0, 3.4, 4.0] {
        let snapped = timing::nearest_part_start(&timeline, t, &NoVoices);
        assert_eq!(
            timing::nearest_part_start(&timeline, snapped, &NoVoices),
            snapped,
            "snap of t={} must be a fixed point",
            t
        );
    }
}

#[test]
fn test_nearestPartStart_acrossScenes_shouldUseAbsoluteTime() {
    let timeline = common::timeline_of(vec![
        common::scene(1, 2.0, "a"),
        common::scene(2, 2.0, "b|c"),
    ]);

    assert_eq!(timing::nearest_part_start(&timeline, 3.5, &NoVoices), 3.0);
    assert_eq!(timing::nearest_part_start(&timeline, 2.0, &NoVoices), 2.0);
    assert_eq!(timing::nearest_part_start(&timeline, 99.0, &NoVoices), 3.0);
}

#[test]
fn test_pointerToTime_shouldClampAndRoundToMilliseconds() {
    assert_eq!(timing::pointer_to_time(0.5, 10.0), 5.0);
    assert_eq!(timing::pointer_to_time(1.5, 10.0), 10.0);
    assert_eq!(timing::pointer_to_time(-0.25, 10.0), 0.0);
    assert_eq!(timing::pointer_to_time(0.33333333, 3.0), 1.0);
}

#[test]
fn test_pointerToTime_withDegenerateInputs_shouldReturnZero() {
    assert_eq!(timing::pointer_to_time(0.5, 0.0), 0.0);
    assert_eq!(timing::pointer_to_time(0.5, -1.0), 0.0);
    assert_eq!(timing::pointer_to_time(f64::NAN, 10.0), 0.0);
    assert_eq!(timing::pointer_to_time(0.5, f64::INFINITY), 0.0);
}

#[test]
fn test_roundMs_shouldKeepThreeDecimals() {
    assert_eq!(timing::round_ms(1.23456), 1.235);
    assert_eq!(timing::round_ms(0.0004), 0.0);
}

#[test]
fn test_sceneWindows_withRandomTimelines_shouldPartitionTheTimeline() {
    let mut rng = rand::rng();

    for _ in 0..50 {
        let scene_count = rng.random_range(1..=8);
        let mut scenes = Vec::with_capacity(scene_count);
        for _ in 0..scene_count {
            let group = rng.random_range(1..=3);
            let duration = rng.random_range(0.5..5.0);
            let text = ["a", "a|b", "a|b|c"][rng.random_range(0..3)];
            if rng.random_bool(0.5) {
                scenes.push(common::scene_with_transition(
                    group,
                    duration,
                    text,
                    Transition::Fade,
                    rng.random_range(0.0..0.6),
                ));
            } else {
                scenes.push(common::scene(group, duration, text));
            }
        }
        let timeline = common::timeline_of(scenes);

        let windows = timing::scene_windows(&timeline, &NoVoices);
        let total = timing::total_duration(&timeline, &NoVoices);

        assert_eq!(windows[0].start, 0.0);
        assert!((windows[windows.len() - 1].end - total).abs() < 1e-9);
        for pair in windows.windows(2) {
            assert!(
                (pair[0].end - pair[1].start).abs() < 1e-9,
                "windows must be contiguous"
            );
        }
        for window in &windows {
            assert!(window.duration() > 0.0);
            assert_eq!(
                timing::scene_index_at_time(&timeline, window.start, &NoVoices),
                window.scene_index,
                "window start must resolve to its own scene"
            );
        }
    }
}

#[test]
fn test_voiceDurations_throughStore_shouldIgnoreUnusableEntries() {
    let store = seeded_store("narrator-a", &[("Alpha.", 0.0)]);
    assert_eq!(store.part_duration("narrator-a", "Alpha."), None);

    let store = seeded_store("narrator-a", &[("Alpha.", 1.5)]);
    assert_eq!(store.part_duration("narrator-a", "Alpha."), Some(1.5));
    assert_eq!(store.part_duration("narrator-b", "Alpha."), None);
}
