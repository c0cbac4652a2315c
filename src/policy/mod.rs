//! Retry policies.
//!
//! Converts optimizer estimates into escalating, attempt-indexed resource
//! schedules and renders them for a workflow engine.
//!
//! # Pipeline
//!
//! 1. [`PolicyGenerator`] derives one [`CategoryPolicy`] per estimate: an
//!    [`EscalationRule`] per estimated dimension and an optional retry
//!    override.
//! 2. [`render_nextflow_config`] serializes the policies together with the
//!    global [`ProcessDefaults`].

mod escalation;
mod nextflow;

pub use escalation::{
    CategoryPolicy, EscalationRule, PolicyGenerator, ProcessDefaults,
    DEFAULT_RETRY_EXIT_STATUSES, MAX_RETRIES,
};
pub use nextflow::render_nextflow_config;
