//! Estimate-and-clamp pipeline.
//!
//! # Algorithm
//!
//! For each category with at least one successful measurement:
//!
//! 1. Estimate an upper bound per dimension (censored quantile fit).
//! 2. Multiply by the safety multiplier.
//! 3. Clamp to `[min, max]`. An estimate above `max` is capped when the
//!    observed maximum stays within `max`, and dropped when it does not.
//! 4. Round wall time down to whole minutes.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, warn};

use super::{Diagnostic, DiagnosticKind, Estimate, EstimationReport};
use crate::models::{
    Category, ClampRange, ClampRanges, Dimension, EstimatedResources, Measurement, Subcategory,
};
use crate::survival::{QuantileEstimator, WeibullEstimator};

/// Default confidence level.
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

/// Default safety multiplier.
pub const DEFAULT_MULTIPLIER: f64 = 1.2;

const SECONDS_PER_MINUTE: f64 = 60.0;

/// Owns the category registries of one run and estimates over them.
///
/// # Example
///
/// ```
/// use u_allocate::models::{ClampRanges, Measurement, Resources};
/// use u_allocate::optimizer::Optimizer;
///
/// let mut opt = Optimizer::new(0.95, 1.0);
/// for mem in [100.0, 150.0, 120.0, 180.0, 200.0] {
///     opt.add_measurement(Measurement::new("align", "", Resources::new(mem, 600.0 + mem), true));
/// }
///
/// let clamp = ClampRanges::none().with_memory(50.0, 1000.0);
/// let report = opt.estimate_all(&clamp);
/// let memory = report.get("align").unwrap().resources.memory.unwrap();
/// assert!(memory >= 200.0 && memory <= 1000.0);
/// ```
#[derive(Debug, Clone)]
pub struct Optimizer {
    confidence: f64,
    multiplier: f64,
    estimator: Arc<dyn QuantileEstimator>,
    categories: Vec<Category>,
    category_index: HashMap<String, usize>,
    subcategories: Vec<Subcategory>,
    subcategory_index: HashMap<String, usize>,
}

impl Optimizer {
    /// Creates an optimizer with the Weibull estimator.
    pub fn new(confidence: f64, multiplier: f64) -> Self {
        Self {
            confidence,
            multiplier,
            estimator: Arc::new(WeibullEstimator),
            categories: Vec::new(),
            category_index: HashMap::new(),
            subcategories: Vec::new(),
            subcategory_index: HashMap::new(),
        }
    }

    /// Replaces the quantile estimator.
    pub fn with_estimator<E: QuantileEstimator + 'static>(mut self, estimator: E) -> Self {
        self.estimator = Arc::new(estimator);
        self
    }

    /// Confidence level.
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Safety multiplier.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Routes a measurement to its category and, if tagged, its subcategory.
    pub fn add_measurement(&mut self, measurement: Measurement) {
        if !measurement.subcategory().is_empty() {
            let idx = match self.subcategory_index.get(measurement.subcategory()) {
                Some(&idx) => idx,
                None => {
                    let idx = self.subcategories.len();
                    self.subcategories
                        .push(Subcategory::new(measurement.subcategory()));
                    self.subcategory_index
                        .insert(measurement.subcategory().to_string(), idx);
                    idx
                }
            };
            self.subcategories[idx]
                .add_measurement(measurement.category(), *measurement.resources());
        }

        let idx = match self.category_index.get(measurement.category()) {
            Some(&idx) => idx,
            None => {
                let idx = self.categories.len();
                self.categories.push(Category::new(measurement.category()));
                self.category_index
                    .insert(measurement.category().to_string(), idx);
                idx
            }
        };
        self.categories[idx].add_measurement(measurement);
    }

    /// Categories in first-seen order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Looks up a category by name.
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.category_index.get(name).map(|&i| &self.categories[i])
    }

    /// Subcategories in first-seen order.
    pub fn subcategories(&self) -> &[Subcategory] {
        &self.subcategories
    }

    /// Looks up a subcategory by name.
    pub fn subcategory(&self, name: &str) -> Option<&Subcategory> {
        self.subcategory_index
            .get(name)
            .map(|&i| &self.subcategories[i])
    }

    /// Total measurements across all categories.
    pub fn count_measurements(&self) -> usize {
        self.categories.iter().map(Category::submitted_count).sum()
    }

    /// Whether at least one category exists and every category has a success.
    pub fn is_full_coverage(&self) -> bool {
        !self.categories.is_empty() && self.categories.iter().all(|c| c.success_count() > 0)
    }

    /// Estimates every category with at least one success.
    ///
    /// Categories without a success are skipped silently. Fit failures and
    /// clamp violations are isolated to their (category, dimension) and
    /// reported in [`EstimationReport::diagnostics`].
    pub fn estimate_all(&self, clamp: &ClampRanges) -> EstimationReport<'_> {
        let mut report = EstimationReport::default();
        for category in &self.categories {
            if let Some(resources) = self.estimate_category(category, clamp, &mut report.diagnostics)
            {
                report.estimates.push(Estimate {
                    category,
                    resources,
                });
            }
        }
        report
    }

    fn estimate_category(
        &self,
        category: &Category,
        clamp: &ClampRanges,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<EstimatedResources> {
        let Some(observed) = category.max_observed() else {
            debug!(category = %category.name(), submitted = category.submitted_count(), "no successful runs; skipping");
            return None;
        };

        let mut estimate = EstimatedResources::default();
        for dim in Dimension::ALL {
            let raw = match category.estimate_upper_bound(dim, self.confidence, &*self.estimator)
            {
                Ok(raw) => raw,
                Err(err) => {
                    warn!(category = %category.name(), dimension = %dim, error = %err, "estimation failed");
                    diagnostics.push(Diagnostic::new(
                        category.name(),
                        dim,
                        DiagnosticKind::FitFailed(err),
                    ));
                    continue;
                }
            };
            debug!(
                category = %category.name(),
                dimension = %dim,
                raw,
                estimator = self.estimator.name(),
                "raw estimate"
            );

            let mut value = raw * self.multiplier;

            if let Some(range) = clamp.get(dim) {
                value = value.max(range.min);
                if value > range.max {
                    let seen = observed.get(dim);
                    if seen > range.max {
                        error!(
                            category = %category.name(),
                            dimension = %dim,
                            estimate = value,
                            observed = seen,
                            ceiling = range.max,
                            "existing and estimated resources exceeded clamp"
                        );
                        diagnostics.push(Diagnostic::new(
                            category.name(),
                            dim,
                            DiagnosticKind::ClampUnresolvable {
                                estimate: value,
                                observed: seen,
                                ceiling: range.max,
                            },
                        ));
                        continue;
                    }
                    warn!(
                        category = %category.name(),
                        dimension = %dim,
                        estimate = value,
                        observed = seen,
                        ceiling = range.max,
                        "estimated resources exceeded clamp"
                    );
                    diagnostics.push(Diagnostic::new(
                        category.name(),
                        dim,
                        DiagnosticKind::ClampCapped {
                            estimate: value,
                            observed: seen,
                            ceiling: range.max,
                        },
                    ));
                    value = range.max;
                }
            }

            if dim == Dimension::WallTime {
                value = round_wall_time(value, clamp.wall_time);
            }
            estimate.set(dim, Some(value));
        }

        Some(estimate)
    }
}

/// Rounds seconds down to a whole minute.
///
/// If that would fall under the clamp minimum, the first whole minute at or
/// above the minimum is used instead.
pub fn round_wall_time(seconds: f64, range: Option<ClampRange>) -> f64 {
    let floored = (seconds / SECONDS_PER_MINUTE).floor() * SECONDS_PER_MINUTE;
    match range {
        Some(r) if floored < r.min => (r.min / SECONDS_PER_MINUTE).ceil() * SECONDS_PER_MINUTE,
        _ => floored,
    }
}
