/*!
 * Adaptive inter-batch pacing for synthesis fills.
 *
 * The delay between batches grows when the provider signals rate limiting
 * and decays back toward the configured base after clean batches. State is
 * shared across concurrent ensures so every caller benefits from what any
 * of them learned about the service's current mood.
 */

use parking_lot::Mutex;
use std::time::Duration;

/// Smallest delay a rate-limit signal can set when the base delay is zero
const RATE_LIMIT_FLOOR_MS: u64 = 250;

/// Delays below base + this snap back to base when decaying
const DECAY_SNAP_MS: u64 = 10;

/// Shared adaptive delay between synthesis batches
#[derive(Debug)]
pub struct AdaptivePacer {
    /// Configured resting delay in milliseconds
    base_ms: u64,
    /// Hard ceiling in milliseconds
    max_ms: u64,
    /// Current delay in milliseconds
    current_ms: Mutex<u64>,
}

impl AdaptivePacer {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        let max_ms = max_ms.max(base_ms);
        Self {
            base_ms,
            max_ms,
            current_ms: Mutex::new(base_ms),
        }
    }

    /// Delay to apply before the next batch.
    pub fn current_delay(&self) -> Duration {
        Duration::from_millis(*self.current_ms.lock())
    }

    /// A batch hit a rate limit: double the delay, capped at the maximum.
    pub fn note_rate_limited(&self) {
        let mut current = self.current_ms.lock();
        let next = if *current == 0 {
            RATE_LIMIT_FLOOR_MS
        } else {
            current.saturating_mul(2)
        };
        *current = next.min(self.max_ms).max(self.base_ms);
    }

    /// A batch completed cleanly: decay a quarter of the way back to base.
    pub fn note_success(&self) {
        let mut current = self.current_ms.lock();
        if *current <= self.base_ms {
            return;
        }
        let above = *current - self.base_ms;
        let decayed = self.base_ms + above - above / 4;
        *current = if decayed <= self.base_ms + DECAY_SNAP_MS {
            self.base_ms
        } else {
            decayed
        };
    }
}
