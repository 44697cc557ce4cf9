//! Collaborator contracts
//!
//! The engine observes two backends: the document pipeline (identifier
//! resolution and status) and the search service (readiness probe). Both
//! are traits so the transport stays swappable (HTTP in production, a
//! scripted mock in tests).

use super::types::DocumentStatus;
use async_trait::async_trait;

/// Errors from collaborator calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// The resource is not registered yet
    #[error("not found: {0}")]
    NotFound(String),
    /// Transient backend or network failure
    #[error("service unavailable: {0}")]
    Unavailable(String),
    /// The backend answered with something we could not read
    #[error("response decode error: {0}")]
    Decode(String),
    #[error("client configuration error: {0}")]
    Config(String),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Document pipeline lookups.
#[async_trait]
pub trait PipelineClient: Send + Sync {
    /// Map an external document key to the pipeline's internal identifier.
    ///
    /// Fails with [`ClientError::NotFound`] while the document is not yet
    /// registered.
    async fn resolve_identifier(&self, external_key: &str) -> Result<String, ClientError>;

    /// Fetch the raw status of a resolved document.
    async fn get_status(&self, internal_id: &str) -> Result<DocumentStatus, ClientError>;
}

/// Search-index readiness check.
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// `Ok(false)` means the document exists but is not queryable yet; that
    /// is an answer, not a failure.
    async fn probe_readiness(&self, internal_id: &str) -> Result<bool, ClientError>;
}
