//! Estimation orchestration.
//!
//! [`Optimizer`] owns the category and subcategory registries for one run,
//! together with the confidence level, safety multiplier and quantile
//! estimator. [`Optimizer::estimate_all`] turns the registry into one
//! bounded [`Estimate`] per category plus a list of [`Diagnostic`]s.
//!
//! # Failure Isolation
//!
//! | Situation | Effect |
//! |-----------|--------|
//! | No successful measurement | Category skipped, no diagnostic |
//! | Fit failure | Dimension dropped, warning |
//! | Estimate above clamp, history within | Capped at clamp, warning |
//! | Estimate and history above clamp | Dimension dropped, error |
//!
//! Categories are independent: nothing one category does affects another.

mod engine;
mod report;

pub use engine::{round_wall_time, Optimizer, DEFAULT_CONFIDENCE, DEFAULT_MULTIPLIER};
pub use report::{Diagnostic, DiagnosticKind, Estimate, EstimationReport, Severity};
