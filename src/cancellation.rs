/*!
 * Cooperative cancellation.
 *
 * A token is shared between a playback session and whoever may stop it.
 * Cancellation is sticky: once cancelled a token never resets, and a new
 * session gets a fresh token. Long-running loops poll `is_cancelled` after
 * every await; suspensions select against `cancelled()` so a stop lands
 * without waiting out a timer or an audio clip.
 */

use tokio::sync::watch;

use crate::errors::PlaybackError;

/// Sticky cancellation flag, cheap to clone and share across tasks
#[derive(Debug, Clone)]
pub struct CancellationToken {
    tx: watch::Sender<bool>,
}

impl CancellationToken {
    /// Create a fresh, uncancelled token.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Flip the token. Idempotent; wakes every waiter.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Whether the token has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Error out when cancelled, for use with `?` at loop checkpoints.
    pub fn check(&self) -> Result<(), PlaybackError> {
        if self.is_cancelled() {
            Err(PlaybackError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolve once the token is cancelled. Resolves immediately when it
    /// already is.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
