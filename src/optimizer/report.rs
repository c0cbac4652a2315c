//! Estimation output and diagnostics.

use std::fmt;

use crate::models::{Category, Dimension, EstimatedResources};
use crate::survival::FitError;

/// A category paired with its final (multiplied, clamped, rounded) estimate.
#[derive(Debug, Clone)]
pub struct Estimate<'a> {
    /// The estimated category.
    pub category: &'a Category,
    /// Estimated allocation; `None` dimensions are unavailable.
    pub resources: EstimatedResources,
}

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Recovered locally; the output is still usable.
    Warning,
    /// A dimension's directive was dropped.
    Error,
}

/// What went wrong for one (category, dimension).
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticKind {
    /// The quantile estimator could not produce a value.
    FitFailed(FitError),
    /// The estimate exceeded the clamp ceiling but observed history never
    /// did; the estimate was capped at the ceiling.
    ClampCapped {
        /// Estimate after the multiplier, before capping.
        estimate: f64,
        /// Largest observed value.
        observed: f64,
        /// Clamp ceiling.
        ceiling: f64,
    },
    /// Both the estimate and observed history exceed the clamp ceiling;
    /// the dimension was dropped.
    ClampUnresolvable {
        /// Estimate after the multiplier.
        estimate: f64,
        /// Largest observed value.
        observed: f64,
        /// Clamp ceiling.
        ceiling: f64,
    },
}

impl DiagnosticKind {
    /// Severity of this kind.
    pub fn severity(&self) -> Severity {
        match self {
            Self::FitFailed(_) | Self::ClampCapped { .. } => Severity::Warning,
            Self::ClampUnresolvable { .. } => Severity::Error,
        }
    }
}

/// A problem encountered while estimating one dimension of one category.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Category name.
    pub category: String,
    /// Affected dimension.
    pub dimension: Dimension,
    /// What happened.
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    /// Creates a diagnostic.
    pub fn new(category: impl Into<String>, dimension: Dimension, kind: DiagnosticKind) -> Self {
        Self {
            category: category.into(),
            dimension,
            kind,
        }
    }

    /// Severity of this diagnostic.
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::FitFailed(err) => write!(
                f,
                "could not estimate {} for {}: {err}",
                self.dimension, self.category
            ),
            DiagnosticKind::ClampCapped {
                estimate,
                observed,
                ceiling,
            } => write!(
                f,
                "estimated {} for {} exceeded clamp {ceiling} (estimate {estimate}, observed {observed}); capped",
                self.dimension, self.category
            ),
            DiagnosticKind::ClampUnresolvable {
                estimate,
                observed,
                ceiling,
            } => write!(
                f,
                "existing and estimated {} for {} exceeded clamp {ceiling} (estimate {estimate}, observed {observed}); dropped",
                self.dimension, self.category
            ),
        }
    }
}

/// Result of one estimation run.
#[derive(Debug, Clone, Default)]
pub struct EstimationReport<'a> {
    /// One entry per category with at least one success, in registry order.
    pub estimates: Vec<Estimate<'a>>,
    /// Per-dimension problems, in the order they were found.
    pub diagnostics: Vec<Diagnostic>,
}

impl<'a> EstimationReport<'a> {
    /// Whether no estimate was generated at all.
    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }

    /// Number of estimated categories.
    pub fn len(&self) -> usize {
        self.estimates.len()
    }

    /// Estimate for a category, if one was produced.
    pub fn get(&self, category: &str) -> Option<&Estimate<'a>> {
        self.estimates.iter().find(|e| e.category.name() == category)
    }

    /// Diagnostics of the given severity.
    pub fn diagnostics_with(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.severity() == severity)
    }
}
