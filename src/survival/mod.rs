//! Censored-data quantile estimation.
//!
//! Turns the observed values of one resource dimension into an upper
//! bound on the true requirement. Each value is paired with an event flag:
//!
//! - **Event** (`true`): the task completed, so its true requirement is the
//!   observed value.
//! - **Censored** (`false`): the task was terminated early, so its true
//!   requirement is only known to be *at least* the observed value.
//!
//! The bound is the time at which the fitted survival function drops to
//! `1 - confidence`, i.e. the `confidence` quantile of the requirement
//! distribution.
//!
//! # Estimators
//!
//! [`QuantileEstimator`] is the pluggable seam; [`WeibullEstimator`] is the
//! default, a two-parameter Weibull maximum-likelihood fit with
//! right-censoring.
//!
//! # References
//!
//! - Lawless (2003), "Statistical Models and Methods for Lifetime Data", Ch. 5
//! - Klein & Moeschberger (2003), "Survival Analysis", Ch. 12

mod weibull;

pub use weibull::{WeibullEstimator, WeibullFit, ZERO_EPSILON};

use std::fmt::Debug;
use thiserror::Error;

/// Reasons a quantile could not be estimated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// No values were supplied.
    #[error("no observations to fit")]
    Empty,

    /// Values and event flags differ in length.
    #[error("{values} values but {observed} event flags")]
    LengthMismatch {
        /// Number of values.
        values: usize,
        /// Number of event flags.
        observed: usize,
    },

    /// A value is negative, NaN or infinite.
    #[error("invalid observation: {0}")]
    InvalidValue(f64),

    /// Every observation is censored.
    #[error("all observations are censored")]
    NoEvents,

    /// The likelihood has no finite maximum (e.g. identical values).
    #[error("degenerate sample: likelihood has no finite maximum")]
    Degenerate,

    /// The solver failed to bracket or converge on a root.
    #[error("fit did not converge")]
    NoConvergence,

    /// A probability outside the open interval (0, 1).
    #[error("probability {0} outside (0, 1)")]
    InvalidProbability(f64),
}

/// Estimates an upper-confidence bound from censored observations.
///
/// Implementations must be deterministic: the same inputs always produce
/// the same output.
pub trait QuantileEstimator: Send + Sync + Debug {
    /// Estimator name (e.g., "weibull").
    fn name(&self) -> &'static str;

    /// Returns a value that bounds the true requirement with probability
    /// at least `confidence`.
    ///
    /// `values[i]` is an exact requirement when `observed[i]` is `true`,
    /// and a lower bound otherwise.
    fn upper_bound(
        &self,
        values: &[f64],
        observed: &[bool],
        confidence: f64,
    ) -> Result<f64, FitError>;
}
