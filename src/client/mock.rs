//! Scripted collaborator for tests and offline runs
//!
//! Each operation replays a queue of canned results. Once a queue runs dry
//! the last result repeats, so a script only needs to describe the
//! transitions it cares about.

use super::traits::{ClientError, PipelineClient, ReadinessProbe};
use super::types::DocumentStatus;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

struct Script<T> {
    queue: Mutex<VecDeque<Result<T, ClientError>>>,
    last: Mutex<Option<Result<T, ClientError>>>,
    calls: AtomicUsize,
}

impl<T: Clone> Script<T> {
    fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    fn push(&self, result: Result<T, ClientError>) {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).push_back(result);
    }

    fn next(&self, fallback: impl FnOnce() -> Result<T, ClientError>) -> Result<T, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(result) = self.queue.lock().unwrap_or_else(|e| e.into_inner()).pop_front() {
            *last = Some(result);
        }
        last.clone().unwrap_or_else(fallback)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Mock pipeline + search backend.
///
/// Unscripted defaults: resolve fails with `NotFound`, status fails with
/// `Unavailable`, the probe answers "not ready".
pub struct MockPipeline {
    resolve: Script<String>,
    status: Script<DocumentStatus>,
    probe: Script<bool>,
    status_delay: Option<Duration>,
}

impl MockPipeline {
    pub fn new() -> Self {
        Self {
            resolve: Script::new(),
            status: Script::new(),
            probe: Script::new(),
            status_delay: None,
        }
    }

    /// Resolve every key to `id`.
    pub fn resolves_to(self, id: impl Into<String>) -> Self {
        self.resolve.push(Ok(id.into()));
        self
    }

    pub fn with_resolve_failure(self, error: ClientError) -> Self {
        self.resolve.push(Err(error));
        self
    }

    pub fn with_status(self, status: impl Into<String>, chunk_count: u64) -> Self {
        self.status.push(Ok(DocumentStatus::new(status, chunk_count)));
        self
    }

    pub fn with_status_failure(self, error: ClientError) -> Self {
        self.status.push(Err(error));
        self
    }

    pub fn with_probe(self, ready: bool) -> Self {
        self.probe.push(Ok(ready));
        self
    }

    pub fn with_probe_failure(self, error: ClientError) -> Self {
        self.probe.push(Err(error));
        self
    }

    /// Delay every status response, to simulate a slow backend.
    pub fn with_status_delay(mut self, delay: Duration) -> Self {
        self.status_delay = Some(delay);
        self
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve.calls()
    }

    pub fn status_calls(&self) -> usize {
        self.status.calls()
    }

    pub fn probe_calls(&self) -> usize {
        self.probe.calls()
    }
}

impl Default for MockPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PipelineClient for MockPipeline {
    async fn resolve_identifier(&self, external_key: &str) -> Result<String, ClientError> {
        self.resolve
            .next(|| Err(ClientError::NotFound(format!("no document for '{}'", external_key))))
    }

    async fn get_status(&self, internal_id: &str) -> Result<DocumentStatus, ClientError> {
        let result = self
            .status
            .next(|| Err(ClientError::Unavailable(format!("no scripted status for '{}'", internal_id))));
        if let Some(delay) = self.status_delay {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

#[async_trait]
impl ReadinessProbe for MockPipeline {
    async fn probe_readiness(&self, _internal_id: &str) -> Result<bool, ClientError> {
        self.probe.next(|| Ok(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unscripted_mock_uses_defaults() {
        let mock = MockPipeline::new();

        assert!(mock.resolve_identifier("key").await.unwrap_err().is_not_found());
        assert!(matches!(
            mock.get_status("id").await,
            Err(ClientError::Unavailable(_))
        ));
        assert!(!mock.probe_readiness("id").await.unwrap());
    }

    #[tokio::test]
    async fn script_replays_then_repeats_last() {
        let mock = MockPipeline::new()
            .with_status("downloading", 0)
            .with_status("converted", 4);

        assert_eq!(mock.get_status("id").await.unwrap().status, "downloading");
        assert_eq!(mock.get_status("id").await.unwrap().status, "converted");
        let repeated = mock.get_status("id").await.unwrap();
        assert_eq!(repeated.status, "converted");
        assert_eq!(repeated.chunk_count, 4);
        assert_eq!(mock.status_calls(), 3);
    }

    #[tokio::test]
    async fn failures_can_precede_success() {
        let mock = MockPipeline::new()
            .with_resolve_failure(ClientError::NotFound("dl".into()))
            .resolves_to("dl-1");

        assert!(mock.resolve_identifier("key").await.is_err());
        assert_eq!(mock.resolve_identifier("key").await.unwrap(), "dl-1");
        assert_eq!(mock.resolve_calls(), 2);
    }
}
