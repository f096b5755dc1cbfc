/*!
 * Voice cache service.
 *
 * Sits between the timeline and a synthesis provider: resolves part markup,
 * fills missing cache entries in bounded batches, answers coverage queries
 * and exposes cached durations to the timing calculator.
 *
 * Concurrent fills for the same key are collapsed onto one shared in-flight
 * future, so a markup is never synthesized twice no matter how many scenes,
 * ensures or tasks ask for it at once.
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use log::{debug, warn};
use parking_lot::Mutex;

use crate::app_config::SynthesisConfig;
use crate::cancellation::CancellationToken;
use crate::errors::{PlaybackError, SynthesisError};
use crate::synth::SpeechSynthesizer;
use crate::timeline::Timeline;
use crate::timing::VoiceDurations;
use crate::voice::pacer::AdaptivePacer;
use crate::voice::store::{VoiceEntry, VoiceStore, voice_key};

type FillResult = Result<VoiceEntry, SynthesisError>;
type SharedFill = Shared<BoxFuture<'static, FillResult>>;

/// Voice cache: store, provider and fill orchestration
pub struct VoiceCache {
    /// Entry storage, shared with clones
    store: VoiceStore,
    /// Synthesis provider
    synthesizer: Arc<dyn SpeechSynthesizer>,
    /// In-flight fills keyed like the store; at most one per key
    pending: Arc<Mutex<HashMap<String, SharedFill>>>,
    /// Adaptive delay between fill batches
    pacer: Arc<AdaptivePacer>,
    /// Parts synthesized concurrently per batch
    batch_size: usize,
    /// Rounds a rate-limited part is retried before counting as failed
    rate_limit_retries: u32,
}

impl VoiceCache {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, options: &SynthesisConfig) -> Self {
        Self {
            store: VoiceStore::new(),
            synthesizer,
            pending: Arc::new(Mutex::new(HashMap::new())),
            pacer: Arc::new(AdaptivePacer::new(
                options.batch_delay_ms,
                options.batch_delay_max_ms,
            )),
            batch_size: options.batch_size.max(1),
            rate_limit_retries: options.retry_count,
        }
    }

    /// Underlying entry store.
    pub fn store(&self) -> &VoiceStore {
        &self.store
    }

    /// Usable cached entry for one markup, if any.
    pub fn get(&self, voice_id: &str, markup: &str) -> Option<VoiceEntry> {
        self.store.get(voice_id, markup)
    }

    /// Whether every speakable part of a scene has usable audio. Scenes
    /// with no resolved voice need none.
    pub fn scene_covered(&self, timeline: &Timeline, scene_index: usize) -> bool {
        let Some(voice) = timeline.resolved_voice(scene_index) else {
            return true;
        };
        timeline
            .scene_parts(scene_index)
            .iter()
            .filter(|markup| !markup.is_empty())
            .all(|markup| self.store.contains_usable(voice, markup))
    }

    /// First scene lacking coverage, scanning in timeline order.
    pub fn first_coverage_gap(&self, timeline: &Timeline) -> Option<usize> {
        (0..timeline.len()).find(|&i| !self.scene_covered(timeline, i))
    }

    /// Whether the whole timeline has usable audio.
    pub fn has_full_coverage(&self, timeline: &Timeline) -> bool {
        self.first_coverage_gap(timeline).is_none()
    }

    /// Summed cached audio length of a scene's speakable parts. `None` when
    /// the scene has no voice, no speakable text, or any part is missing.
    pub fn cached_scene_duration(&self, timeline: &Timeline, scene_index: usize) -> Option<f64> {
        let voice = timeline.resolved_voice(scene_index)?;
        let mut total = 0.0;
        let mut spoken = 0usize;
        for markup in timeline.scene_parts(scene_index) {
            if markup.is_empty() {
                continue;
            }
            total += self.store.part_duration(voice, &markup)?;
            spoken += 1;
        }
        if spoken > 0 { Some(total) } else { None }
    }

    /// Make sure every speakable part of a scene has a usable entry.
    ///
    /// Present entries short-circuit unless `force` regenerates them.
    /// Missing parts fill in batches of `batch_size`; the pacer's delay
    /// runs between batches and adapts to rate-limit signals, retrying
    /// rate-limited parts up to the configured round count. Returns the
    /// entries in part order, or `SynthesisFailed` with the part indices
    /// that never produced usable audio.
    pub async fn ensure_scene(
        &self,
        timeline: &Timeline,
        scene_index: usize,
        token: &CancellationToken,
        force: bool,
    ) -> Result<Vec<VoiceEntry>, PlaybackError> {
        let Some(voice) = timeline.resolved_voice(scene_index) else {
            return Ok(Vec::new());
        };
        let voice = voice.to_string();

        let speakable: Vec<(usize, String)> = timeline
            .scene_parts(scene_index)
            .into_iter()
            .enumerate()
            .filter(|(_, markup)| !markup.is_empty())
            .collect();

        if speakable.is_empty() {
            return Ok(Vec::new());
        }

        let mut resolved: Vec<Option<VoiceEntry>> = vec![None; speakable.len()];
        let mut remaining: Vec<(usize, usize, String)> = Vec::new();
        for (slot, (part_index, markup)) in speakable.iter().enumerate() {
            if !force {
                if let Some(entry) = self.store.get(&voice, markup) {
                    resolved[slot] = Some(entry);
                    continue;
                }
            }
            remaining.push((slot, *part_index, markup.clone()));
        }

        if remaining.is_empty() {
            debug!("Scene {} already fully covered", scene_index);
            return Ok(resolved.into_iter().flatten().collect());
        }

        debug!(
            "Filling {} part(s) for scene {} (batch size {})",
            remaining.len(),
            scene_index,
            self.batch_size
        );

        let mut failed: Vec<usize> = Vec::new();
        let mut first_chunk = true;
        let mut round = 0u32;

        loop {
            let mut rate_limited_slots: Vec<usize> = Vec::new();

            for chunk in remaining.chunks(self.batch_size) {
                token.check()?;

                if !first_chunk {
                    self.pause_between_batches(token).await?;
                }
                first_chunk = false;

                let fills = chunk.iter().map(|(slot, part_index, markup)| {
                    let voice = voice.as_str();
                    async move {
                        (*slot, *part_index, self.fetch_entry(voice, markup, force).await)
                    }
                });
                let results = futures::future::join_all(fills).await;

                let mut chunk_rate_limited = false;
                for (slot, part_index, result) in results {
                    match result {
                        Ok(entry) => resolved[slot] = Some(entry),
                        Err(err) if err.is_rate_limit() => {
                            chunk_rate_limited = true;
                            rate_limited_slots.push(slot);
                        }
                        Err(err) => {
                            warn!(
                                "Synthesis failed for scene {} part {}: {}",
                                scene_index, part_index, err
                            );
                            failed.push(part_index);
                        }
                    }
                }

                if chunk_rate_limited {
                    self.pacer.note_rate_limited();
                } else {
                    self.pacer.note_success();
                }
            }

            if rate_limited_slots.is_empty() {
                break;
            }
            if round >= self.rate_limit_retries {
                for slot in rate_limited_slots {
                    let part_index = speakable[slot].0;
                    warn!(
                        "Giving up on rate-limited part {} of scene {} after {} round(s)",
                        part_index,
                        scene_index,
                        round + 1
                    );
                    failed.push(part_index);
                }
                break;
            }

            remaining = rate_limited_slots
                .into_iter()
                .map(|slot| (slot, speakable[slot].0, speakable[slot].1.clone()))
                .collect();
            round += 1;
        }

        if !failed.is_empty() {
            failed.sort_unstable();
            failed.dedup();
            return Err(PlaybackError::SynthesisFailed {
                scene_index,
                part_indices: failed,
            });
        }

        Ok(resolved.into_iter().flatten().collect())
    }

    /// Ensure coverage for every scene, scenes running in parallel.
    pub async fn ensure_timeline(
        &self,
        timeline: &Timeline,
        token: &CancellationToken,
        force: bool,
    ) -> Result<(), PlaybackError> {
        self.ensure_timeline_with_progress(timeline, token, force, |_, _| {})
            .await
    }

    /// Ensure coverage with a per-scene completion callback, for progress
    /// reporting. The callback receives (completed, total).
    pub async fn ensure_timeline_with_progress<F>(
        &self,
        timeline: &Timeline,
        token: &CancellationToken,
        force: bool,
        progress: F,
    ) -> Result<(), PlaybackError>
    where
        F: Fn(usize, usize) + Send + Sync,
    {
        let scenes: Vec<usize> = (0..timeline.len())
            .filter(|&i| force || !self.scene_covered(timeline, i))
            .collect();
        if scenes.is_empty() {
            return Ok(());
        }

        debug!("Ensuring voice coverage for {} scene(s)", scenes.len());

        let total = scenes.len();
        let completed = AtomicUsize::new(0);
        let progress = &progress;
        let completed = &completed;

        let results = futures::future::join_all(scenes.iter().map(|&scene_index| async move {
            let result = self.ensure_scene(timeline, scene_index, token, force).await;
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            progress(done, total);
            result
        }))
        .await;

        // Report the first failure in scene order; entries already filled
        // for other scenes stay cached.
        for result in results {
            result?;
        }
        Ok(())
    }

    /// Resolve one entry: cached value unless `force`, joining any fill
    /// already in flight for the same key.
    async fn fetch_entry(&self, voice_id: &str, markup: &str, force: bool) -> FillResult {
        if !force {
            if let Some(entry) = self.store.get(voice_id, markup) {
                return Ok(entry);
            }
        }

        let key = voice_key(voice_id, markup);
        let fill = self.join_or_start_fill(&key, voice_id, markup);
        fill.await
    }

    /// Join the in-flight fill for `key`, or start one. A forced fetch
    /// joins an existing fill too: the slot is replaced either way and a
    /// second billable call would buy nothing.
    fn join_or_start_fill(&self, key: &str, voice_id: &str, markup: &str) -> SharedFill {
        let mut pending = self.pending.lock();
        if let Some(existing) = pending.get(key) {
            debug!("Joining in-flight synthesis for voice '{}'", voice_id);
            return existing.clone();
        }

        let fill = self.start_fill(key.to_string(), voice_id.to_string(), markup.to_string());
        pending.insert(key.to_string(), fill.clone());
        fill
    }

    fn start_fill(&self, key: String, voice_id: String, markup: String) -> SharedFill {
        let synthesizer = Arc::clone(&self.synthesizer);
        let store = self.store.clone();
        let pending = Arc::clone(&self.pending);

        async move {
            let result = match synthesizer.synthesize(&voice_id, &markup).await {
                Ok(voice) => {
                    let entry = VoiceEntry {
                        payload: voice.payload,
                        duration_secs: voice.duration_secs,
                        markup: markup.clone(),
                    };
                    if entry.is_usable() {
                        // Insert before unparking waiters so a cache read
                        // right after the await always sees the entry
                        store.insert(&voice_id, &markup, entry.clone());
                        Ok(entry)
                    } else {
                        Err(SynthesisError::Unusable {
                            voice_id: voice_id.clone(),
                            reason: format!(
                                "duration={}, payload empty={}",
                                entry.duration_secs,
                                entry.payload.is_empty()
                            ),
                        })
                    }
                }
                Err(err) => Err(err),
            };

            pending.lock().remove(&key);
            result
        }
        .boxed()
        .shared()
    }

    async fn pause_between_batches(&self, token: &CancellationToken) -> Result<(), PlaybackError> {
        let delay = self.pacer.current_delay();
        if delay.is_zero() {
            return Ok(());
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => Ok(()),
            _ = token.cancelled() => Err(PlaybackError::Cancelled),
        }
    }
}

impl VoiceDurations for VoiceCache {
    fn part_duration(&self, voice_id: &str, markup: &str) -> Option<f64> {
        self.store.part_duration(voice_id, markup)
    }
}
