//! Per-entity polling configuration

use crate::backoff::{DEFAULT_PROBE_COOLDOWN, MIN_PROBE_COOLDOWN};
use crate::progress::StageWeights;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Whether the readiness probe runs at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMode {
    #[default]
    Auto,
    Off,
}

/// Default tick interval for individually tracked entities.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Tick interval for bulk list views.
pub const BULK_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Polling configuration. Every field has a default, so configuration
/// files may set any subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Tick interval in milliseconds; also the resolve backoff base
    pub interval_ms: u64,
    pub weights: StageWeights,
    pub probe: ProbeMode,
    /// Minimum time between readiness probes, floored at 30 s
    pub probe_cooldown_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            weights: StageWeights::default(),
            probe: ProbeMode::Auto,
            probe_cooldown_ms: DEFAULT_PROBE_COOLDOWN.as_millis() as u64,
        }
    }
}

impl PollConfig {
    /// Reduced-load preset for list views: slower ticks, no probing.
    pub fn bulk_list() -> Self {
        Self {
            interval_ms: BULK_POLL_INTERVAL.as_millis() as u64,
            probe: ProbeMode::Off,
            ..Self::default()
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_probe(mut self, probe: ProbeMode) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_probe_cooldown(mut self, cooldown: Duration) -> Self {
        self.probe_cooldown_ms = cooldown.as_millis() as u64;
        self
    }

    pub fn with_weights(mut self, weights: StageWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Tick interval, never zero.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    /// Probe cooldown with the floor applied.
    pub fn probe_cooldown(&self) -> Duration {
        Duration::from_millis(self.probe_cooldown_ms).max(MIN_PROBE_COOLDOWN)
    }
}
