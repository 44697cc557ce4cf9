//! Cooldown and latch for the readiness probe
//!
//! The probe asks the search service whether a document is queryable. It
//! is expensive, so it runs at most once per cooldown window, backs off on
//! failure, and stops for good once it has succeeded.

use crate::progress::Stage;
use std::time::Duration;
use tokio::time::Instant;

/// Lowest cooldown a caller may configure.
pub const MIN_PROBE_COOLDOWN: Duration = Duration::from_secs(30);

/// Cooldown used when the caller does not configure one.
pub const DEFAULT_PROBE_COOLDOWN: Duration = Duration::from_secs(120);

/// Upper bound on the probe backoff.
pub const MAX_PROBE_BACKOFF: Duration = Duration::from_secs(600);

/// Probe gate for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeCooldown {
    cooldown: Duration,
    backoff: Duration,
    last_probe_at: Option<Instant>,
    /// Stage reached when the probe succeeded; `Some` is the latch
    latched: Option<Stage>,
}

impl ProbeCooldown {
    /// Start observation with the backoff seeded to the cooldown floor.
    pub fn new(cooldown: Duration) -> Self {
        let cooldown = cooldown.max(MIN_PROBE_COOLDOWN);
        Self {
            cooldown,
            backoff: cooldown,
            last_probe_at: None,
            latched: None,
        }
    }

    pub fn should_probe(&self, now: Instant) -> bool {
        if self.latched.is_some() {
            return false;
        }
        self.last_probe_at
            .map_or(true, |last| now.saturating_duration_since(last) >= self.backoff)
    }

    /// Note that a probe is about to be issued at `now`.
    pub fn mark_attempt(&mut self, now: Instant) {
        self.last_probe_at = Some(now);
    }

    /// The probe call itself failed: double the backoff within
    /// `[cooldown, MAX_PROBE_BACKOFF]`.
    pub fn record_failure(&mut self) -> Duration {
        let doubled = if self.backoff.is_zero() {
            self.cooldown
        } else {
            self.backoff.saturating_mul(2)
        };
        self.backoff = doubled.max(self.cooldown).min(MAX_PROBE_BACKOFF);
        self.backoff
    }

    /// Set the latch. `pending_consumers > 0` means answers are still
    /// waiting to be graded.
    pub fn record_success(&mut self, pending_consumers: usize) -> Stage {
        let stage = if pending_consumers > 0 { Stage::Grade } else { Stage::Done };
        self.latched = Some(stage);
        stage
    }

    pub fn is_latched(&self) -> bool {
        self.latched.is_some()
    }

    /// Stage the entity was advanced to when the latch was set.
    pub fn latched_stage(&self) -> Option<Stage> {
        self.latched
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}

impl Default for ProbeCooldown {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_COOLDOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldown_has_a_floor() {
        let gate = ProbeCooldown::new(Duration::from_secs(5));
        assert_eq!(gate.cooldown(), MIN_PROBE_COOLDOWN);
        assert_eq!(gate.backoff(), MIN_PROBE_COOLDOWN);
        assert_eq!(ProbeCooldown::default().backoff(), DEFAULT_PROBE_COOLDOWN);
    }

    #[test]
    fn first_probe_is_immediate() {
        assert!(ProbeCooldown::default().should_probe(Instant::now()));
    }

    #[test]
    fn probe_waits_for_backoff_window() {
        let now = Instant::now();
        let mut gate = ProbeCooldown::new(Duration::from_secs(60));
        gate.mark_attempt(now);

        assert!(!gate.should_probe(now + Duration::from_secs(59)));
        assert!(gate.should_probe(now + Duration::from_secs(60)));
    }

    #[test]
    fn failures_double_up_to_ceiling() {
        let mut gate = ProbeCooldown::new(Duration::from_secs(120));
        assert_eq!(gate.record_failure(), Duration::from_secs(240));
        assert_eq!(gate.record_failure(), Duration::from_secs(480));
        assert_eq!(gate.record_failure(), MAX_PROBE_BACKOFF);
        assert_eq!(gate.record_failure(), MAX_PROBE_BACKOFF);
    }

    #[test]
    fn attempts_without_failure_keep_the_window() {
        let now = Instant::now();
        let mut gate = ProbeCooldown::new(Duration::from_secs(45));
        gate.mark_attempt(now);
        gate.mark_attempt(now + Duration::from_secs(45));

        assert_eq!(gate.backoff(), Duration::from_secs(45));
        assert!(gate.should_probe(now + Duration::from_secs(90)));
    }

    #[test]
    fn latch_blocks_probing_forever() {
        let now = Instant::now();
        let mut gate = ProbeCooldown::default();
        gate.mark_attempt(now);

        assert_eq!(gate.record_success(0), Stage::Done);

        assert!(gate.is_latched());
        assert!(!gate.should_probe(now));
        assert!(!gate.should_probe(now + Duration::from_secs(86_400)));
    }

    #[test]
    fn pending_consumers_latch_to_grade() {
        let mut gate = ProbeCooldown::default();
        assert_eq!(gate.record_success(3), Stage::Grade);
        assert_eq!(gate.latched_stage(), Some(Stage::Grade));
    }
}
