//! Registry of watched entities
//!
//! `watch` spawns one polling task per entity and hands back a
//! `watch::Receiver` carrying its latest snapshot. `unwatch` (or dropping
//! the tracker) cancels the task; after that no update is published, even
//! if a request that was in flight completes.

use super::cancel::CancellationToken;
use super::config::PollConfig;
use super::poller::EntityPoller;
use super::state::TrackedEntity;
use crate::client::Session;
use crate::exam::ExamItem;
use crate::progress::ProgressSnapshot;
use dashmap::DashMap;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

struct Watch {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    receiver: watch::Receiver<ProgressSnapshot>,
}

impl Watch {
    fn stop(&self) {
        self.cancel.cancel();
    }
}

/// Owns the polling tasks for every observed entity.
///
/// Must be used from within a tokio runtime.
pub struct ProgressTracker {
    session: Session,
    config: PollConfig,
    watches: DashMap<String, Watch>,
}

impl ProgressTracker {
    pub fn new(session: Session, config: PollConfig) -> Self {
        Self {
            session,
            config,
            watches: DashMap::new(),
        }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Begin observing `entity` with the tracker's configuration.
    pub fn watch(&self, entity: TrackedEntity) -> watch::Receiver<ProgressSnapshot> {
        self.watch_with(entity, self.config.clone())
    }

    /// Begin observing `entity` with its own configuration.
    ///
    /// Watching a key that is already observed restarts it from scratch:
    /// the old task is torn down and its state discarded.
    pub fn watch_with(&self, entity: TrackedEntity, config: PollConfig) -> watch::Receiver<ProgressSnapshot> {
        let key = entity.key.clone();
        let cancel = CancellationToken::new();
        let (publisher, receiver) = watch::channel(ProgressSnapshot::idle());

        let poller = EntityPoller::new(entity, config, self.session.clone());
        let task = tokio::spawn(poller.run(cancel.clone(), publisher));

        let watch = Watch {
            cancel,
            task,
            receiver: receiver.clone(),
        };
        if let Some(previous) = self.watches.insert(key.clone(), watch) {
            debug!(key = %key, "restarting observation");
            previous.stop();
        }
        receiver
    }

    /// Observe an exam's backing document.
    ///
    /// An exam without a document reference cannot be tracked; it gets a
    /// receiver that stays at idle/0.
    pub fn watch_exam(&self, exam: &ExamItem) -> watch::Receiver<ProgressSnapshot> {
        match exam.tracked_entity() {
            Some(entity) => self.watch(entity),
            None => {
                debug!(exam_id = exam.exam_id, "exam has no document reference");
                watch::channel(ProgressSnapshot::idle()).1
            }
        }
    }

    /// Stop observing `key`. Returns false if it was not observed.
    pub fn unwatch(&self, key: &str) -> bool {
        match self.watches.remove(key) {
            Some((_, watch)) => {
                watch.stop();
                true
            }
            None => false,
        }
    }

    /// Another receiver for an observed key.
    pub fn subscribe(&self, key: &str) -> Option<watch::Receiver<ProgressSnapshot>> {
        self.watches.get(key).map(|w| w.receiver.clone())
    }

    /// Latest published snapshot for an observed key.
    pub fn current(&self, key: &str) -> Option<ProgressSnapshot> {
        self.watches.get(key).map(|w| *w.receiver.borrow())
    }

    pub fn is_watching(&self, key: &str) -> bool {
        self.watches.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.watches.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.watches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }

    /// Stop every task and wait for them to finish.
    pub async fn shutdown(&self) {
        let keys = self.keys();
        let mut handles = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some((_, watch)) = self.watches.remove(&key) {
                watch.stop();
                handles.push(watch.task);
            }
        }
        for handle in handles {
            let _ = handle.await;
        }
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        for entry in self.watches.iter() {
            entry.value().stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockPipeline;
    use crate::progress::Stage;
    use std::sync::Arc;

    fn tracker(mock: MockPipeline) -> (ProgressTracker, Arc<MockPipeline>) {
        let mock = Arc::new(mock);
        (ProgressTracker::new(Session::shared(mock.clone()), PollConfig::default()), mock)
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_publishes_immediately() {
        let (tracker, _mock) = tracker(MockPipeline::new().resolves_to("dl").with_status("downloaded", 0));

        let mut rx = tracker.watch(TrackedEntity::new("doc"));
        rx.changed().await.unwrap();

        assert_eq!(rx.borrow().stage, Stage::Convert);
        assert_eq!(tracker.current("doc").map(|s| s.progress), Some(15));
    }

    #[tokio::test(start_paused = true)]
    async fn unwatch_removes_entity() {
        let (tracker, _mock) = tracker(MockPipeline::new());
        tracker.watch(TrackedEntity::new("doc"));

        assert!(tracker.is_watching("doc"));
        assert!(tracker.unwatch("doc"));
        assert!(!tracker.unwatch("doc"));
        assert!(tracker.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn exam_without_document_stays_idle() {
        let (tracker, mock) = tracker(MockPipeline::new());
        let exam: ExamItem = serde_json::from_value(serde_json::json!({
            "exam_id": 7,
            "title": "No book attached"
        }))
        .unwrap();

        let rx = tracker.watch_exam(&exam);

        assert_eq!(*rx.borrow(), ProgressSnapshot::idle());
        assert!(tracker.is_empty());
        assert_eq!(mock.resolve_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_everything() {
        let (tracker, _mock) = tracker(MockPipeline::new());
        tracker.watch(TrackedEntity::new("a"));
        tracker.watch(TrackedEntity::new("b"));

        tracker.shutdown().await;

        assert!(tracker.is_empty());
    }
}
