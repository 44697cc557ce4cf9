//! Explicit collaborator context handed to every poller

use super::http::{HttpPipelineClient, HttpReadinessProbe};
use super::traits::{ClientError, PipelineClient, ReadinessProbe};
use crate::config::ServicesConfig;
use std::sync::Arc;

/// The backends a poller talks to.
///
/// Cloning is cheap; every watched entity gets its own clone and shares
/// the underlying clients.
#[derive(Clone)]
pub struct Session {
    pub pipeline: Arc<dyn PipelineClient>,
    pub probe: Arc<dyn ReadinessProbe>,
}

impl Session {
    pub fn new(pipeline: Arc<dyn PipelineClient>, probe: Arc<dyn ReadinessProbe>) -> Self {
        Self { pipeline, probe }
    }

    /// Build HTTP collaborators from service configuration.
    pub fn http(services: &ServicesConfig) -> Result<Self, ClientError> {
        let timeout = services.request_timeout();
        let pipeline = HttpPipelineClient::new(&services.books_url, timeout)?;
        let probe = HttpReadinessProbe::new(&services.search_url, timeout)?;
        Ok(Self::new(Arc::new(pipeline), Arc::new(probe)))
    }

    /// A session whose pipeline and probe are the same object.
    pub fn shared<C>(client: Arc<C>) -> Self
    where
        C: PipelineClient + ReadinessProbe + 'static,
    {
        Self::new(client.clone(), client)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}
