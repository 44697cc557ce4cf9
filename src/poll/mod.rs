//! Polling orchestrator
//!
//! One task per observed entity. The task owns the entity's [`PollState`],
//! ticks on a fixed interval, and publishes a
//! [`ProgressSnapshot`](crate::progress::ProgressSnapshot) through a
//! `tokio::sync::watch` channel. Tasks share nothing except the
//! collaborator [`Session`](crate::client::Session).

mod cancel;
mod config;
mod poller;
mod state;
mod tracker;

pub use cancel::CancellationToken;
pub use config::{PollConfig, ProbeMode, BULK_POLL_INTERVAL, DEFAULT_POLL_INTERVAL};
pub use poller::EntityPoller;
pub use state::{PollPhase, PollState, TrackedEntity};
pub use tracker::ProgressTracker;
