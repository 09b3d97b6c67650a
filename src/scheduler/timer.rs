//! One-shot timer guard
//!
//! Timers deliver their payload back into the scheduler's internal queue
//! instead of running logic themselves. Each armed timer carries a unique
//! token; the scheduler acts on a firing only when the token still matches
//! the timer it has on record, so a message from a cancelled or replaced
//! timer is a no-op even if it was already queued when the timer was
//! dropped.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A pending one-shot timer. Dropping the guard cancels the timer.
#[derive(Debug)]
pub struct TimerGuard {
    token: u64,
    handle: JoinHandle<()>,
}

impl TimerGuard {
    /// Arm a timer that sends `message` after `delay`.
    pub fn spawn<M: Send + 'static>(
        token: u64,
        delay: Duration,
        tx: mpsc::UnboundedSender<M>,
        message: M,
    ) -> Self {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the scheduler shut down.
            let _ = tx.send(message);
        });
        Self { token, handle }
    }

    /// Whether a fired message with `token` belongs to this arming.
    pub fn matches(&self, token: u64) -> bool {
        self.token == token
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
