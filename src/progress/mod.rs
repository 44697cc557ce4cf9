//! Pure progress inference
//!
//! Turns a coarse backend status into a pipeline [`Stage`] and a stage plus
//! optional intra-stage fraction into a 0–100 progress figure. Nothing here
//! performs I/O or holds state.

mod stage;
mod weights;

pub use stage::{infer_stage, Stage, UnknownStage};
pub use weights::{weight_progress, StageWeights};

use serde::Serialize;

/// The value published to observers for one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub stage: Stage,
    /// Completion percentage, 0–100
    pub progress: u8,
}

impl ProgressSnapshot {
    pub fn idle() -> Self {
        Self {
            stage: Stage::Idle,
            progress: 0,
        }
    }

    pub fn compute(stage: Stage, intra_stage_fraction: Option<f64>, weights: &StageWeights) -> Self {
        Self {
            stage,
            progress: weight_progress(stage, intra_stage_fraction, weights),
        }
    }

    pub fn label(&self) -> &'static str {
        self.stage.label()
    }
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        Self::idle()
    }
}

impl std::fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} • {}%", self.label(), self.progress)
    }
}
