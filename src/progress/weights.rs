//! Weighted progress across pipeline stages

use super::stage::Stage;
use serde::{Deserialize, Serialize};

/// Share of the overall progress bar assigned to each pipeline stage.
///
/// Deserialization fills missing fields from the defaults, so a config
/// file may override any subset of stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageWeights {
    pub download: u32,
    pub convert: u32,
    pub process: u32,
    pub embed: u32,
    pub grade: u32,
}

impl Default for StageWeights {
    fn default() -> Self {
        Self {
            download: 15,
            convert: 15,
            process: 25,
            embed: 25,
            grade: 20,
        }
    }
}

impl StageWeights {
    /// Weight of a stage; `Idle` and `Done` have none.
    pub fn weight(&self, stage: Stage) -> u32 {
        match stage {
            Stage::Download => self.download,
            Stage::Convert => self.convert,
            Stage::Process => self.process,
            Stage::Embed => self.embed,
            Stage::Grade => self.grade,
            Stage::Idle | Stage::Done => 0,
        }
    }

    /// Override one stage, keeping the others. Ignored for `Idle` and `Done`.
    pub fn with(mut self, stage: Stage, weight: u32) -> Self {
        match stage {
            Stage::Download => self.download = weight,
            Stage::Convert => self.convert = weight,
            Stage::Process => self.process = weight,
            Stage::Embed => self.embed = weight,
            Stage::Grade => self.grade = weight,
            Stage::Idle | Stage::Done => {}
        }
        self
    }

    pub fn total(&self) -> u32 {
        Stage::PIPELINE.iter().map(|s| self.weight(*s)).sum()
    }
}

/// Compute the 0–100 progress figure for a stage.
///
/// Every stage before `stage` counts in full, `stage` itself counts by
/// `intra_stage_fraction` percent (0 when unknown), later stages count
/// nothing. The result is rounded and capped at 100 so oversized custom
/// weights cannot overflow the bar.
pub fn weight_progress(stage: Stage, intra_stage_fraction: Option<f64>, weights: &StageWeights) -> u8 {
    match stage {
        Stage::Idle => return 0,
        Stage::Done => return 100,
        _ => {}
    }

    let fraction = match intra_stage_fraction {
        Some(f) if !f.is_nan() => f.clamp(0.0, 100.0),
        _ => 0.0,
    };

    let mut sum = 0.0;
    for current in Stage::PIPELINE {
        let weight = f64::from(weights.weight(current));
        if current == stage {
            sum += weight * fraction / 100.0;
            break;
        }
        sum += weight;
    }

    sum.round().min(100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_hundred() {
        assert_eq!(StageWeights::default().total(), 100);
    }

    #[test]
    fn terminal_and_idle_short_circuit() {
        let weights = StageWeights::default();
        assert_eq!(weight_progress(Stage::Done, None, &weights), 100);
        assert_eq!(weight_progress(Stage::Done, Some(0.0), &weights), 100);
        assert_eq!(weight_progress(Stage::Idle, Some(80.0), &weights), 0);
    }

    #[test]
    fn prior_stages_count_in_full() {
        let weights = StageWeights::default();
        assert_eq!(weight_progress(Stage::Download, None, &weights), 0);
        assert_eq!(weight_progress(Stage::Convert, None, &weights), 15);
        assert_eq!(weight_progress(Stage::Process, None, &weights), 30);
        assert_eq!(weight_progress(Stage::Embed, None, &weights), 55);
        assert_eq!(weight_progress(Stage::Grade, None, &weights), 80);
    }

    #[test]
    fn monotone_in_stage_order() {
        let weights = StageWeights::default().with(Stage::Convert, 0);
        let mut last = weight_progress(Stage::Idle, Some(0.0), &weights);
        for stage in Stage::PIPELINE.into_iter().chain([Stage::Done]) {
            let next = weight_progress(stage, Some(0.0), &weights);
            assert!(next >= last, "{stage} regressed: {next} < {last}");
            last = next;
        }
    }

    #[test]
    fn intra_stage_fraction_is_clamped() {
        let weights = StageWeights::default();
        assert_eq!(weight_progress(Stage::Process, Some(50.0), &weights), 43); // 30 + 12.5
        assert_eq!(weight_progress(Stage::Process, Some(250.0), &weights), 55);
        assert_eq!(weight_progress(Stage::Process, Some(-10.0), &weights), 30);
        assert_eq!(weight_progress(Stage::Process, Some(f64::NAN), &weights), 30);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let weights = StageWeights::default().with(Stage::Download, 40);
        assert_eq!(weights.convert, 15);
        assert_eq!(weight_progress(Stage::Convert, None, &weights), 40);
    }

    #[test]
    fn partial_override_from_yaml() {
        let weights: StageWeights = serde_yaml::from_str("embed: 30\ngrade: 15\n").unwrap();
        assert_eq!(weights.download, 15);
        assert_eq!(weights.embed, 30);
        assert_eq!(weights.grade, 15);
    }

    #[test]
    fn oversized_weights_cap_at_hundred() {
        let weights = StageWeights::default().with(Stage::Download, 90).with(Stage::Convert, 90);
        assert_eq!(weight_progress(Stage::Process, None, &weights), 100);
    }
}
