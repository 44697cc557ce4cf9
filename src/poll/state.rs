//! Tracked entities and their per-entity polling state

use super::config::PollConfig;
use crate::backoff::{ProbeCooldown, ResolveBackoff};
use crate::progress::{ProgressSnapshot, Stage, StageWeights};
use serde::{Deserialize, Serialize};

/// One document under observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedEntity {
    /// Stable external key (the exam's document reference)
    pub key: String,
    /// Internal pipeline identifier, if already known
    #[serde(default)]
    pub resolved_id: Option<String>,
    /// Consumers (students awaiting grading) that still need the pipeline
    #[serde(default)]
    pub pending_consumers: usize,
}

impl TrackedEntity {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            resolved_id: None,
            pending_consumers: 0,
        }
    }

    pub fn with_pending_consumers(mut self, count: usize) -> Self {
        self.pending_consumers = count;
        self
    }

    pub fn with_resolved_id(mut self, id: impl Into<String>) -> Self {
        self.resolved_id = Some(id.into());
        self
    }
}

/// Where an entity sits in the reconciliation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    /// No internal identifier yet; resolve attempts are backoff-gated
    Unresolved,
    /// Identifier known, status is polled every tick
    Polling,
    /// Stage reached `done`; further ticks change nothing
    Terminal,
}

/// Mutable state owned by one entity's polling task.
#[derive(Debug, Clone)]
pub struct PollState {
    pub stage: Stage,
    resolved_id: Option<String>,
    pub resolve: ResolveBackoff,
    pub probe: ProbeCooldown,
    /// Partial progress within `stage`, 0–100; the pipeline API does not
    /// report it yet
    pub intra_stage_fraction: Option<f64>,
}

impl PollState {
    /// Fresh state at the start of observation.
    pub fn new(entity: &TrackedEntity, config: &PollConfig) -> Self {
        Self {
            stage: Stage::Idle,
            resolved_id: entity.resolved_id.clone(),
            resolve: ResolveBackoff::new(),
            probe: ProbeCooldown::new(config.probe_cooldown()),
            intra_stage_fraction: None,
        }
    }

    pub fn resolved_id(&self) -> Option<&str> {
        self.resolved_id.as_deref()
    }

    /// Record the internal identifier. A known identifier is never replaced.
    pub fn set_resolved_id(&mut self, id: String) {
        if self.resolved_id.is_none() {
            self.resolved_id = Some(id);
        }
    }

    /// Drop to "no progress" after a failure or unrecognized status.
    pub fn reset_to_idle(&mut self) {
        self.stage = Stage::Idle;
        self.intra_stage_fraction = None;
    }

    pub fn phase(&self) -> PollPhase {
        if self.resolved_id.is_none() {
            PollPhase::Unresolved
        } else if self.stage.is_terminal() {
            PollPhase::Terminal
        } else {
            PollPhase::Polling
        }
    }

    pub fn snapshot(&self, weights: &StageWeights) -> ProgressSnapshot {
        ProgressSnapshot::compute(self.stage, self.intra_stage_fraction, weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_idle_and_unresolved() {
        let state = PollState::new(&TrackedEntity::new("doc"), &PollConfig::default());
        assert_eq!(state.stage, Stage::Idle);
        assert_eq!(state.phase(), PollPhase::Unresolved);
        assert_eq!(state.snapshot(&StageWeights::default()), ProgressSnapshot::idle());
    }

    #[test]
    fn known_identifier_starts_polling() {
        let entity = TrackedEntity::new("doc").with_resolved_id("dl-1");
        let state = PollState::new(&entity, &PollConfig::default());
        assert_eq!(state.resolved_id(), Some("dl-1"));
        assert_eq!(state.phase(), PollPhase::Polling);
    }

    #[test]
    fn resolved_id_is_never_replaced() {
        let mut state = PollState::new(&TrackedEntity::new("doc"), &PollConfig::default());
        state.set_resolved_id("dl-1".into());
        state.set_resolved_id("dl-2".into());
        assert_eq!(state.resolved_id(), Some("dl-1"));
    }

    #[test]
    fn done_is_terminal() {
        let mut state = PollState::new(&TrackedEntity::new("doc").with_resolved_id("dl"), &PollConfig::default());
        state.stage = Stage::Done;
        assert_eq!(state.phase(), PollPhase::Terminal);
        assert_eq!(state.snapshot(&StageWeights::default()).progress, 100);
    }

    #[test]
    fn reset_clears_fraction() {
        let mut state = PollState::new(&TrackedEntity::new("doc"), &PollConfig::default());
        state.stage = Stage::Process;
        state.intra_stage_fraction = Some(40.0);
        state.reset_to_idle();
        assert_eq!(state.stage, Stage::Idle);
        assert_eq!(state.intra_stage_fraction, None);
    }
}
