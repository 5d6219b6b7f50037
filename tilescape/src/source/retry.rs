//! Backoff bookkeeping for tiles whose load failed recoverably.

use std::time::{Duration, Instant};

/// Delay before the first retry.
pub const MIN_RETRY_DELAY: Duration = Duration::from_millis(1_000);

/// Upper bound of the retry delay.
pub const MAX_RETRY_DELAY: Duration = Duration::from_millis(32_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    pub last_attempt: Instant,
    pub delay: Duration,
    pub failures: u32,
}

impl RetryState {
    /// State after the first failure at `now`.
    pub fn first(now: Instant) -> Self {
        Self {
            last_attempt: now,
            delay: MIN_RETRY_DELAY,
            failures: 1,
        }
    }

    /// Record another failure: the delay doubles up to [`MAX_RETRY_DELAY`].
    pub fn failed_again(&mut self, now: Instant) {
        self.last_attempt = now;
        self.delay = (self.delay * 2).min(MAX_RETRY_DELAY);
        self.failures = self.failures.saturating_add(1);
    }

    pub fn due_at(&self) -> Instant {
        self.last_attempt + self.delay
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.due_at() <= now
    }
}
