//! Exponential backoff for HTTP 429 responses
//!
//! The wait starts at 32 seconds rather than 1: short waits never clear the
//! API's throttle window. Each consecutive throttle doubles it; the first
//! unthrottled response resets it.

use std::time::Duration;

pub const DEFAULT_INITIAL_WAIT: Duration = Duration::from_secs(32);

/// Once the pending wait exceeds this, credentials are re-validated before sleeping.
pub const DEFAULT_REAUTH_AFTER: Duration = Duration::from_secs(640);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffState {
    initial: Duration,
    wait: Duration,
    reauth_after: Duration,
}

impl BackoffState {
    pub fn new(initial: Duration, reauth_after: Duration) -> Self {
        Self {
            initial,
            wait: initial,
            reauth_after,
        }
    }

    /// Wait that the next throttle will sleep for.
    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// True while a throttling episode is in progress.
    pub fn is_throttled(&self) -> bool {
        self.wait != self.initial
    }

    /// True when a sustained 429 storm should trigger a credential check.
    pub fn needs_reauth(&self) -> bool {
        self.wait > self.reauth_after
    }

    /// Return the wait for this throttle and double it for the next one.
    pub fn advance(&mut self) -> Duration {
        let current = self.wait;
        self.wait = self.wait.saturating_mul(2);
        current
    }

    pub fn reset(&mut self) {
        self.wait = self.initial;
    }
}

impl Default for BackoffState {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_WAIT, DEFAULT_REAUTH_AFTER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waits_double_from_default() {
        let mut backoff = BackoffState::default();
        let waits: Vec<u64> = (0..5).map(|_| backoff.advance().as_secs()).collect();
        assert_eq!(waits, vec![32, 64, 128, 256, 512]);
        assert!(backoff.is_throttled());
    }

    #[test]
    fn reset_returns_to_default() {
        let mut backoff = BackoffState::default();
        backoff.advance();
        backoff.advance();
        backoff.reset();
        assert!(!backoff.is_throttled());
        assert_eq!(backoff.wait(), DEFAULT_INITIAL_WAIT);
    }

    #[test]
    fn reauth_kicks_in_past_ten_minutes() {
        let mut backoff = BackoffState::default();
        // 32, 64, 128, 256, 512 all stay at or below 640
        for _ in 0..5 {
            assert!(!backoff.needs_reauth());
            backoff.advance();
        }
        assert_eq!(backoff.wait().as_secs(), 1024);
        assert!(backoff.needs_reauth());
    }

    #[test]
    fn doubling_saturates() {
        let mut backoff = BackoffState::new(Duration::MAX, Duration::MAX);
        assert_eq!(backoff.advance(), Duration::MAX);
        assert_eq!(backoff.wait(), Duration::MAX);
    }
}
