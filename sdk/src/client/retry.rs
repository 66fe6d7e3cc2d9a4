// Copyright (c) 2026 Meridian Ledger Contributors. MIT License.
// See LICENSE for details.

//! Backoff policy for the execute loop.

use std::time::Duration;

use rand::Rng;

use crate::config::{
    BACKOFF_JITTER_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_REQUEST_TIMEOUT, MAX_BACKOFF, MIN_BACKOFF,
};

/// How hard the client tries before giving up.
///
/// Delays grow exponentially from `min_backoff` to `max_backoff`, with a
/// small random jitter so a fleet of clients recovering from the same
/// outage does not re-arrive in lockstep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Attempt ceiling, counting the first try.
    pub max_attempts: usize,
    /// Delay before the second attempt.
    pub min_backoff: Duration,
    /// Delay growth cap.
    pub max_backoff: Duration,
    /// Per-attempt window for one send-and-receive.
    pub request_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            min_backoff: MIN_BACKOFF,
            max_backoff: MAX_BACKOFF,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl RetryConfig {
    /// The delay to wait after failed attempt number `attempt` (zero
    /// based): `min(min_backoff << attempt, max_backoff)` plus jitter.
    pub(crate) fn delay_for(&self, attempt: usize) -> Duration {
        let shift = attempt.min(16) as u32;
        let base = self
            .min_backoff
            .checked_mul(1u32 << shift)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff);
        let jitter = rand::thread_rng().gen_range(0..=BACKOFF_JITTER_MS);
        base + Duration::from_millis(jitter)
    }
}
