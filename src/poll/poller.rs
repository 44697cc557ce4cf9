//! Per-entity reconciliation loop
//!
//! Each tick:
//! 1. resolve the external key to an internal id (gated by resolve backoff),
//! 2. fetch the raw status and infer a stage,
//! 3. maybe probe search readiness (cooldown-gated, latched on success),
//! 4. recompute progress and hand the snapshot to the publisher.
//!
//! Errors never leave a tick: they downgrade the entity to idle/0 and the
//! next tick starts over.

use super::cancel::CancellationToken;
use super::config::{PollConfig, ProbeMode};
use super::state::{PollPhase, PollState, TrackedEntity};
use crate::client::{ClientError, Session};
use crate::progress::{infer_stage, ProgressSnapshot, Stage};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

/// Owns one entity's state and drives its ticks.
pub struct EntityPoller {
    entity: TrackedEntity,
    config: PollConfig,
    session: Session,
    state: PollState,
}

impl EntityPoller {
    pub fn new(entity: TrackedEntity, config: PollConfig, session: Session) -> Self {
        let state = PollState::new(&entity, &config);
        Self {
            entity,
            config,
            session,
            state,
        }
    }

    pub fn entity(&self) -> &TrackedEntity {
        &self.entity
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    pub fn phase(&self) -> PollPhase {
        self.state.phase()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.state.snapshot(&self.config.weights)
    }

    /// Run one reconciliation step at `now` and return the resulting snapshot.
    pub async fn tick(&mut self, now: Instant) -> ProgressSnapshot {
        if let Err(err) = self.reconcile(now).await {
            warn!(key = %self.entity.key, error = %err, "status poll failed, reporting no progress");
            self.state.reset_to_idle();
        }
        self.snapshot()
    }

    async fn reconcile(&mut self, now: Instant) -> Result<(), ClientError> {
        let id = match self.state.resolved_id() {
            Some(id) => id.to_string(),
            None => match self.resolve(now).await {
                Some(id) => id,
                None => return Ok(()),
            },
        };

        let info = self.session.pipeline.get_status(&id).await?;
        let inferred = infer_stage(&info.status, info.chunk_count);
        let stage = self.apply_probe(now, &id, inferred, info.chunk_count).await;

        if stage != self.state.stage {
            debug!(
                key = %self.entity.key,
                status = %info.status,
                chunks = info.chunk_count,
                from = %self.state.stage,
                to = %stage,
                "stage changed"
            );
        }
        self.state.stage = stage;
        self.state.intra_stage_fraction = None;
        Ok(())
    }

    /// Try to learn the internal id. `None` means "not this tick".
    async fn resolve(&mut self, now: Instant) -> Option<String> {
        if !self.state.resolve.should_attempt(now) {
            trace!(key = %self.entity.key, "resolve gated by backoff");
            return None;
        }

        match self.session.pipeline.resolve_identifier(&self.entity.key).await {
            Ok(id) => {
                self.state.resolve.record_success();
                self.state.set_resolved_id(id.clone());
                info!(key = %self.entity.key, id = %id, "document resolved");
                Some(id)
            }
            Err(err) => {
                let wait = self.state.resolve.record_failure(now, self.config.interval());
                self.state.reset_to_idle();
                if err.is_not_found() {
                    debug!(key = %self.entity.key, retry_in_ms = wait.as_millis() as u64, "document not registered yet");
                } else {
                    warn!(key = %self.entity.key, error = %err, retry_in_ms = wait.as_millis() as u64, "resolve failed");
                }
                None
            }
        }
    }

    /// Apply the readiness latch, probing if eligible.
    ///
    /// Failure (`idle`) and `done` pass through untouched. Once the entity is
    /// done, or latched, any other reading is lifted to that stage.
    async fn apply_probe(&mut self, now: Instant, id: &str, inferred: Stage, chunk_count: u64) -> Stage {
        if matches!(inferred, Stage::Idle | Stage::Done) {
            return inferred;
        }
        // Done holds against stale readings; only a failure leaves it.
        if self.state.stage == Stage::Done {
            return Stage::Done;
        }
        if let Some(ready) = self.state.probe.latched_stage() {
            return ready;
        }

        let content_available = chunk_count > 0 || inferred == Stage::Embed;
        if self.config.probe == ProbeMode::Off
            || !content_available
            || !self.state.probe.should_probe(now)
        {
            return inferred;
        }

        self.state.probe.mark_attempt(now);
        match self.session.probe.probe_readiness(id).await {
            Ok(true) => {
                let ready = self.state.probe.record_success(self.entity.pending_consumers);
                info!(key = %self.entity.key, stage = %ready, "document searchable");
                ready
            }
            Ok(false) => {
                // "Not yet" is an answer, not a failure: the backoff stays put.
                trace!(key = %self.entity.key, "document not searchable yet");
                inferred
            }
            Err(err) => {
                let backoff = self.state.probe.record_failure();
                warn!(
                    key = %self.entity.key,
                    error = %err,
                    backoff_ms = backoff.as_millis() as u64,
                    "readiness probe failed"
                );
                inferred
            }
        }
    }

    /// Tick immediately, then every interval, until `cancel` fires.
    ///
    /// Ticks run one at a time; timer firings missed during a slow tick are
    /// skipped, not replayed. Cancellation drops an in-flight tick, and the
    /// token is checked again before publishing.
    pub async fn run(mut self, cancel: CancellationToken, publisher: watch::Sender<ProgressSnapshot>) {
        let mut interval = tokio::time::interval(self.config.interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        debug!(
            key = %self.entity.key,
            interval_ms = self.config.interval().as_millis() as u64,
            probe = ?self.config.probe,
            "polling started"
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            let snapshot = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                snapshot = self.tick(Instant::now()) => snapshot,
            };

            if cancel.is_cancelled() {
                break;
            }
            publisher.send_if_modified(|current| {
                if *current == snapshot {
                    return false;
                }
                *current = snapshot;
                true
            });
        }

        debug!(key = %self.entity.key, "polling stopped");
    }
}
