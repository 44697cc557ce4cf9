//! Shared helpers for the polling scenario tests
//!
//! `KeyedBackend` answers per document key, so several entities can share
//! one session and still behave independently.

#![allow(dead_code)]

use async_trait::async_trait;
use stagewatch::{ClientError, DocumentStatus, PipelineClient, ReadinessProbe, Session};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
enum Behaviour {
    Status(DocumentStatus),
    Failing,
}

/// Backend keyed by document: key `k` resolves to `id-k`.
#[derive(Default)]
pub struct KeyedBackend {
    behaviours: Mutex<HashMap<String, Behaviour>>,
    status_calls: AtomicUsize,
}

impl KeyedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(self, key: &str, status: &str, chunk_count: u64) -> Self {
        self.set_status(key, status, chunk_count);
        self
    }

    pub fn with_failing_status(self, key: &str) -> Self {
        self.behaviours
            .lock()
            .unwrap()
            .insert(internal_id(key), Behaviour::Failing);
        self
    }

    /// Change what a document reports from now on.
    pub fn set_status(&self, key: &str, status: &str, chunk_count: u64) {
        self.behaviours.lock().unwrap().insert(
            internal_id(key),
            Behaviour::Status(DocumentStatus::new(status, chunk_count)),
        );
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

pub fn internal_id(key: &str) -> String {
    format!("id-{}", key)
}

#[async_trait]
impl PipelineClient for KeyedBackend {
    async fn resolve_identifier(&self, external_key: &str) -> Result<String, ClientError> {
        let id = internal_id(external_key);
        if self.behaviours.lock().unwrap().contains_key(&id) {
            Ok(id)
        } else {
            Err(ClientError::NotFound(external_key.to_string()))
        }
    }

    async fn get_status(&self, internal_id: &str) -> Result<DocumentStatus, ClientError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviours.lock().unwrap().get(internal_id).cloned() {
            Some(Behaviour::Status(status)) => Ok(status),
            Some(Behaviour::Failing) => Err(ClientError::Unavailable("backend down".into())),
            None => Err(ClientError::NotFound(internal_id.to_string())),
        }
    }
}

#[async_trait]
impl ReadinessProbe for KeyedBackend {
    async fn probe_readiness(&self, _internal_id: &str) -> Result<bool, ClientError> {
        Ok(false)
    }
}

pub fn keyed_session(backend: KeyedBackend) -> (Session, Arc<KeyedBackend>) {
    let backend = Arc::new(backend);
    (Session::shared(backend.clone()), backend)
}
