use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::path::Path;
use std::sync::Arc;

use crate::app_config::{Config, SynthesisProvider};
use crate::audio::{SimulatedVoiceOutput, VoiceOutput};
use crate::cancellation::CancellationToken;
use crate::playback::{
    NullObserver, PlayOutcome, PlayScope, PlaybackController, SceneNavigator, ScrubController,
    StageView,
};
use crate::render::{ConsoleRenderer, SceneRenderer};
use crate::synth::SpeechSynthesizer;
use crate::synth::http::HttpSynthesizer;
use crate::synth::mock::MockSynthesizer;
use crate::timeline::Timeline;
use crate::timing::{self, VoiceDurations};
use crate::voice::VoiceCache;

// @module: Application controller for timeline preview

/// Main application controller wiring config, cache and playback
pub struct Controller {
    // @field: App configuration
    config: Config,
    voices: Arc<VoiceCache>,
    playback: Arc<PlaybackController>,
    scrub: ScrubController,
    navigator: SceneNavigator,
    nav_token: parking_lot::Mutex<CancellationToken>,
    view: StageView,
}

impl Controller {
    /// Create a new controller for test purposes with the mock synthesizer
    pub fn new_for_test() -> Result<Self> {
        let mut config = Config::default();
        config.synthesis.provider = SynthesisProvider::Mock;
        Self::with_config(config)
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;

        let synthesizer = Self::build_synthesizer(&config);
        info!("Using {} synthesis provider", config.synthesis.provider.display_name());

        let voices = Arc::new(VoiceCache::new(synthesizer, &config.synthesis));
        let view = StageView::new();
        let renderer: Arc<dyn SceneRenderer> = Arc::new(ConsoleRenderer);
        let output: Arc<dyn VoiceOutput> = Arc::new(SimulatedVoiceOutput);
        let playback = Arc::new(PlaybackController::new(
            Arc::clone(&voices),
            Arc::clone(&renderer),
            output,
            Arc::new(NullObserver),
            view.clone(),
            config.playback.speed,
        ));
        let scrub = ScrubController::new(
            Arc::clone(&voices),
            Arc::clone(&renderer),
            Arc::clone(&playback),
            view.clone(),
            config.playback.scrub_frame_ms,
        );
        let navigator = SceneNavigator::new(
            Arc::clone(&voices),
            renderer,
            view.clone(),
            config.playback.group_dwell_fallback_secs,
            config.playback.speed,
        );

        Ok(Self {
            config,
            voices,
            playback,
            scrub,
            navigator,
            nav_token: parking_lot::Mutex::new(CancellationToken::new()),
            view,
        })
    }

    fn build_synthesizer(config: &Config) -> Arc<dyn SpeechSynthesizer> {
        match config.synthesis.provider {
            SynthesisProvider::Http => Arc::new(HttpSynthesizer::new(
                config.synthesis.endpoint.clone(),
                config.synthesis.api_key.clone(),
                config.synthesis.model.clone(),
                config.synthesis.timeout_secs,
                config.synthesis.retry_count,
                config.synthesis.retry_backoff_ms,
            )),
            SynthesisProvider::Mock => Arc::new(MockSynthesizer::working()),
        }
    }

    /// Voice cache shared with playback.
    pub fn voices(&self) -> &Arc<VoiceCache> {
        &self.voices
    }

    /// Playback state machine.
    pub fn playback(&self) -> &Arc<PlaybackController> {
        &self.playback
    }

    /// Scrub input handler.
    pub fn scrub(&self) -> &ScrubController {
        &self.scrub
    }

    /// Direct scene and part selection.
    pub fn navigator(&self) -> &SceneNavigator {
        &self.navigator
    }

    /// Stage view shared by all collaborators.
    pub fn view(&self) -> &StageView {
        &self.view
    }

    /// Load and validate a timeline document from a JSON file
    pub fn load_timeline(&self, path: &Path) -> Result<Timeline> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read timeline file: {:?}", path))?;
        let timeline = Timeline::from_json_str(&content)
            .context(format!("Failed to parse timeline file: {:?}", path))?;
        timeline.validate().context("Timeline validation failed")?;
        info!(
            "Loaded timeline: {} scene(s), {} part(s)",
            timeline.len(),
            timeline.total_parts()
        );
        Ok(timeline)
    }

    /// Synthesize voice audio for every scene that lacks coverage, with a
    /// progress bar. `force` regenerates entries that already exist.
    pub async fn synthesize(&self, timeline: &Timeline, force: bool) -> Result<()> {
        let start_time = std::time::Instant::now();
        let token = CancellationToken::new();

        let progress_bar = ProgressBar::new(timeline.len() as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} scenes ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.set_message("Synthesizing");

        let pb = progress_bar.clone();
        self.voices
            .ensure_timeline_with_progress(timeline, &token, force, move |completed, total| {
                pb.set_length(total as u64);
                pb.set_position(completed as u64);
            })
            .await?;
        progress_bar.finish_and_clear();

        let (hits, misses, hit_rate) = self.voices.store().stats();
        debug!(
            "Cache after synthesis: {} entries, {} hits, {} misses ({:.1}% hit rate)",
            self.voices.store().len(),
            hits,
            misses,
            hit_rate
        );
        info!(
            "Synthesis complete in {}. {} entries cached.",
            Self::format_duration(start_time.elapsed()),
            self.voices.store().len()
        );
        Ok(())
    }

    /// Play a timeline from `start_offset` under `scope`. Fills missing
    /// coverage first so playback never waits on the network mid-scene.
    pub async fn preview(
        &self,
        timeline: &Timeline,
        scope: PlayScope,
        start_offset: f64,
    ) -> Result<PlayOutcome> {
        if !self.voices.has_full_coverage(timeline) {
            info!("Coverage incomplete, synthesizing before playback");
            self.synthesize(timeline, false).await?;
        }
        let outcome = self.playback.play(timeline, start_offset, scope).await?;
        match outcome {
            PlayOutcome::Completed => info!("Playback completed"),
            PlayOutcome::Stopped => warn!("Playback stopped before the end"),
        }
        Ok(outcome)
    }

    /// Jump to a scene and follow its group, cancelling any previous
    /// navigation still dwelling.
    pub async fn jump_to_scene(&self, timeline: &Timeline, scene_index: usize) -> Result<f64> {
        self.playback.stop();
        let token = {
            let mut slot = self.nav_token.lock();
            slot.cancel();
            *slot = CancellationToken::new();
            slot.clone()
        };
        let offset = self
            .navigator
            .select_scene_with_group_follow(timeline, scene_index, &token)
            .await?;
        Ok(offset)
    }

    /// Stop playback and any group follow in flight.
    pub fn stop(&self) {
        self.playback.stop();
        self.nav_token.lock().cancel();
    }

    /// Print the timing table: one line per scene with its window, entry
    /// transition and part starts.
    pub fn inspect(&self, timeline: &Timeline) -> Result<()> {
        let durations: &dyn VoiceDurations = self.voices.as_ref();
        let windows = timing::scene_windows(timeline, durations);
        info!(
            "Timeline: {} scene(s), total {:.3}s",
            timeline.len(),
            timing::total_duration(timeline, durations)
        );
        for window in &windows {
            let scene = &timeline.scenes[window.scene_index];
            let starts = timing::part_start_times(timeline, window.scene_index, durations);
            let starts_fmt = starts
                .iter()
                .map(|s| format!("{:.3}", s))
                .collect::<Vec<_>>()
                .join(", ");
            info!(
                "  Scene {:>3} [group {}]: {:>8.3}s..{:>8.3}s  entry {:.3}s  {:?}  parts at [{}]",
                window.scene_index,
                scene.group_id,
                window.start,
                window.end,
                window.entry_secs,
                scene.transition,
                starts_fmt
            );
        }
        Ok(())
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
