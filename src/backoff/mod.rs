//! Per-entity rate limiting
//!
//! Two independent gates: [`ResolveBackoff`] for identifier lookups that
//! fail while a document is not yet registered, and [`ProbeCooldown`] for
//! the expensive readiness probe.

mod probe;
mod resolve;

pub use probe::{ProbeCooldown, DEFAULT_PROBE_COOLDOWN, MAX_PROBE_BACKOFF, MIN_PROBE_COOLDOWN};
pub use resolve::{ResolveBackoff, MAX_RESOLVE_BACKOFF};
