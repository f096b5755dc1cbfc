/*!
 * Voice cache storage.
 *
 * Keyed audio entries for resolved part markups. Keys are content-addressed
 * over voice id and markup, so identical narration spoken by the same voice
 * always lands on the same slot regardless of which scene asked for it.
 */

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};

use crate::synth::VoicePayload;
use crate::timing::VoiceDurations;

/// Content-addressed key: hex sha256 over voice id and markup
pub fn voice_key(voice_id: &str, markup: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(voice_id.as_bytes());
    hasher.update([0x1f]);
    hasher.update(markup.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// One cached synthesis result
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceEntry {
    /// Audio payload handed to the output collaborator
    pub payload: VoicePayload,

    /// Spoken length in seconds
    pub duration_secs: f64,

    /// Markup the audio was rendered from, kept for diagnostics
    pub markup: String,
}

impl VoiceEntry {
    /// Whether the entry can back playback and timing: positive duration
    /// and a non-empty payload. Unusable entries are treated as absent.
    pub fn is_usable(&self) -> bool {
        self.duration_secs > 0.0 && !self.payload.is_empty()
    }
}

/// Process-wide voice entry map with hit/miss accounting
pub struct VoiceStore {
    /// Internal entry storage
    entries: Arc<RwLock<HashMap<String, VoiceEntry>>>,

    /// Cache hit counter
    hits: Arc<RwLock<usize>>,

    /// Cache miss counter
    misses: Arc<RwLock<usize>>,
}

impl VoiceStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            hits: Arc::new(RwLock::new(0)),
            misses: Arc::new(RwLock::new(0)),
        }
    }

    /// Get a usable entry. Unusable entries count as misses.
    pub fn get(&self, voice_id: &str, markup: &str) -> Option<VoiceEntry> {
        let key = voice_key(voice_id, markup);
        let entries = self.entries.read();

        match entries.get(&key).filter(|entry| entry.is_usable()) {
            Some(entry) => {
                let mut hits = self.hits.write();
                *hits += 1;

                debug!(
                    "Voice cache hit for '{}' (voice '{}')",
                    truncate_text(markup, 30),
                    voice_id
                );

                Some(entry.clone())
            }
            None => {
                let mut misses = self.misses.write();
                *misses += 1;

                debug!(
                    "Voice cache miss for '{}' (voice '{}')",
                    truncate_text(markup, 30),
                    voice_id
                );

                None
            }
        }
    }

    /// Whether a usable entry exists, without touching the counters.
    pub fn contains_usable(&self, voice_id: &str, markup: &str) -> bool {
        let key = voice_key(voice_id, markup);
        self.entries
            .read()
            .get(&key)
            .map(|entry| entry.is_usable())
            .unwrap_or(false)
    }

    /// Store an entry, replacing whatever sat on the slot before.
    pub fn insert(&self, voice_id: &str, markup: &str, entry: VoiceEntry) {
        let key = voice_key(voice_id, markup);
        let mut entries = self.entries.write();

        entries.insert(key, entry);

        debug!(
            "Cached voice for '{}' (voice '{}')",
            truncate_text(markup, 30),
            voice_id
        );
    }

    /// Get cache statistics as (hits, misses, hit rate).
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = *self.hits.read();
        let misses = *self.misses.read();
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    /// Clear the store and reset the counters.
    pub fn clear(&self) {
        self.entries.write().clear();

        let mut hits = self.hits.write();
        *hits = 0;

        let mut misses = self.misses.write();
        *misses = 0;

        debug!("Voice cache cleared");
    }

    /// Get the number of entries in the store.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for VoiceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for VoiceStore {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            hits: self.hits.clone(),
            misses: self.misses.clone(),
        }
    }
}

impl VoiceDurations for VoiceStore {
    // Counter-free read so timing math does not skew the stats
    fn part_duration(&self, voice_id: &str, markup: &str) -> Option<f64> {
        let key = voice_key(voice_id, markup);
        self.entries
            .read()
            .get(&key)
            .filter(|entry| entry.is_usable())
            .map(|entry| entry.duration_secs)
    }
}

/// Truncate text to a maximum length with ellipsis
fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(max_length).collect::<String>())
    }
}
