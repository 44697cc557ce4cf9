//! stagewatch: progress inference for documents in an exam-grading pipeline
//!
//! Documents behind exams move through download → convert → process →
//! embed → grade on remote services that report only a coarse status
//! string. This crate polls those services per document and turns what
//! they say into a stage and a 0–100 progress figure, without hammering
//! them and without letting stale or unknown states push progress
//! backwards.
//!
//! # Core Concepts
//!
//! - **Stage inference**: raw status → [`Stage`] ([`infer_stage`])
//! - **Progress weighting**: stage → percentage ([`weight_progress`])
//! - **Backoff**: resolve attempts and readiness probes are rate-limited
//!   per entity ([`ResolveBackoff`], [`ProbeCooldown`])
//! - **Tracking**: one polling task per entity, published through a watch
//!   channel ([`ProgressTracker`])
//!
//! # Example
//!
//! ```
//! use stagewatch::{infer_stage, weight_progress, Stage, StageWeights};
//!
//! let stage = infer_stage("converted", 0);
//! assert_eq!(stage, Stage::Process);
//! assert_eq!(weight_progress(stage, None, &StageWeights::default()), 30);
//! ```

pub mod backoff;
pub mod client;
pub mod config;
pub mod exam;
pub mod logging;
pub mod poll;
pub mod progress;

pub use backoff::{ProbeCooldown, ResolveBackoff};
pub use client::{ClientError, DocumentStatus, MockPipeline, PipelineClient, ReadinessProbe, Session};
pub use config::{Config, ConfigError};
pub use exam::ExamItem;
pub use poll::{
    CancellationToken, EntityPoller, PollConfig, PollPhase, PollState, ProbeMode, ProgressTracker,
    TrackedEntity,
};
pub use progress::{infer_stage, weight_progress, ProgressSnapshot, Stage, StageWeights};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
