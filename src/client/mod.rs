//! Collaborator boundary
//!
//! Traits for the pipeline and search backends, their HTTP
//! implementations, a scripted mock, and the [`Session`] that bundles them.

mod http;
mod mock;
mod session;
mod traits;
mod types;

pub use http::{HttpPipelineClient, HttpReadinessProbe};
pub use mock::MockPipeline;
pub use session::Session;
pub use traits::{ClientError, PipelineClient, ReadinessProbe};
pub use types::DocumentStatus;
