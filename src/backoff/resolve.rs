//! Backoff for identifier resolution
//!
//! A document that is not yet registered server-side makes every resolve
//! call fail. Each failure pushes the next attempt out by the current
//! interval and doubles the interval for the failure after that.

use std::time::Duration;
use tokio::time::Instant;

/// Upper bound on the resolve backoff interval.
pub const MAX_RESOLVE_BACKOFF: Duration = Duration::from_secs(60);

/// Gate on resolve attempts for one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveBackoff {
    /// Interval applied on the next failure; zero until the first failure
    backoff: Duration,
    /// No attempt before this instant; `None` means ungated
    next_allowed_at: Option<Instant>,
}

impl ResolveBackoff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn should_attempt(&self, now: Instant) -> bool {
        self.next_allowed_at.map_or(true, |at| now >= at)
    }

    /// Record a failed attempt at `now` and return the wait before the next one.
    ///
    /// The first failure waits one full `base` interval; the interval then
    /// doubles per failure up to [`MAX_RESOLVE_BACKOFF`].
    pub fn record_failure(&mut self, now: Instant, base: Duration) -> Duration {
        let wait = if self.backoff.is_zero() { base } else { self.backoff };
        self.backoff = wait.saturating_mul(2).min(MAX_RESOLVE_BACKOFF);
        self.next_allowed_at = Some(now + wait);
        wait
    }

    /// A single success clears all accumulated backoff.
    pub fn record_success(&mut self) {
        self.backoff = Duration::ZERO;
        self.next_allowed_at = None;
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    pub fn next_allowed_at(&self) -> Option<Instant> {
        self.next_allowed_at
    }
}
