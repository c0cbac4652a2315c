//! Category (job class) model.
//!
//! A category aggregates every measurement of one recurring job class,
//! e.g. a pipeline step name. It tracks submission and success counts and
//! computes the per-dimension observed maximum and upper-bound estimate.

use std::cmp::Ordering;

use super::{Dimension, Measurement, Resources};
use crate::survival::{FitError, QuantileEstimator};

/// All measurements of one job class.
///
/// Identity is the name: two categories with the same name are the same
/// category.
#[derive(Debug, Clone)]
pub struct Category {
    name: String,
    submitted_count: usize,
    success_count: usize,
    measurements: Vec<Measurement>,
}

impl Category {
    /// Creates an empty category.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            submitted_count: 0,
            success_count: 0,
            measurements: Vec::new(),
        }
    }

    /// Category name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of measurements added.
    pub fn submitted_count(&self) -> usize {
        self.submitted_count
    }

    /// Number of successful measurements added.
    pub fn success_count(&self) -> usize {
        self.success_count
    }

    /// Owned measurements, in insertion order.
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    /// Adds a measurement.
    pub fn add_measurement(&mut self, measurement: Measurement) {
        if measurement.is_success() {
            self.success_count += 1;
        }
        self.submitted_count += 1;
        self.measurements.push(measurement);
    }

    /// Ceiling of the largest observed value per dimension, across all
    /// measurements regardless of outcome.
    ///
    /// Returns `None` when the category has no successful measurement.
    pub fn max_observed(&self) -> Option<Resources> {
        if self.success_count == 0 {
            return None;
        }
        let mut max = Resources::default();
        for dim in Dimension::ALL {
            *max.get_mut(dim) = self
                .measurements
                .iter()
                .map(|m| m.resources().get(dim).ceil())
                .fold(0.0, f64::max);
        }
        Some(max)
    }

    /// Upper-bound estimate for one dimension.
    ///
    /// A single measurement yields twice its value; otherwise the values
    /// and success flags are handed to `estimator`.
    pub fn estimate_upper_bound(
        &self,
        dim: Dimension,
        confidence: f64,
        estimator: &dyn QuantileEstimator,
    ) -> Result<f64, FitError> {
        let values: Vec<f64> = self
            .measurements
            .iter()
            .map(|m| m.resources().get(dim))
            .collect();

        match values.as_slice() {
            [] => Err(FitError::Empty),
            [single] => Ok(2.0 * single),
            _ => {
                let observed: Vec<bool> =
                    self.measurements.iter().map(|m| m.is_success()).collect();
                estimator.upper_bound(&values, &observed, confidence)
            }
        }
    }
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Category {}

impl std::hash::Hash for Category {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Orders categories by evidence volume: more submissions first, then
/// more successes.
pub fn compare_by_volume(a: &Category, b: &Category) -> Ordering {
    (b.submitted_count, b.success_count).cmp(&(a.submitted_count, a.success_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survival::WeibullEstimator;

    fn measurement(memory: f64, wall_time: f64, success: bool) -> Measurement {
        Measurement::new("align", "", Resources::new(memory, wall_time), success)
    }

    #[test]
    fn test_counts() {
        let mut c = Category::new("align");
        c.add_measurement(measurement(100.0, 60.0, true));
        c.add_measurement(measurement(120.0, 70.0, false));
        c.add_measurement(measurement(110.0, 65.0, true));

        assert_eq!(c.submitted_count(), 3);
        assert_eq!(c.success_count(), 2);
        assert_eq!(c.measurements().len(), 3);
    }

    #[test]
    fn test_max_observed_includes_failures() {
        let mut c = Category::new("align");
        c.add_measurement(measurement(100.2, 60.0, true));
        c.add_measurement(measurement(150.5, 30.0, false));

        let max = c.max_observed().unwrap();
        assert!((max.memory - 151.0).abs() < 1e-10);
        assert!((max.wall_time - 60.0).abs() < 1e-10);
    }

    #[test]
    fn test_max_observed_requires_success() {
        let mut c = Category::new("align");
        c.add_measurement(measurement(50.0, 10.0, false));
        assert!(c.max_observed().is_none());
    }

    #[test]
    fn test_single_measurement_doubles() {
        let mut c = Category::new("align");
        c.add_measurement(measurement(123.0, 45.0, true));

        let est = WeibullEstimator;
        assert_eq!(
            c.estimate_upper_bound(Dimension::Memory, 0.95, &est),
            Ok(246.0)
        );
        assert_eq!(
            c.estimate_upper_bound(Dimension::WallTime, 0.95, &est),
            Ok(90.0)
        );
    }

    #[test]
    fn test_empty_category_cannot_estimate() {
        let c = Category::new("align");
        assert_eq!(
            c.estimate_upper_bound(Dimension::Memory, 0.95, &WeibullEstimator),
            Err(FitError::Empty)
        );
    }

    #[test]
    fn test_estimate_delegates_to_estimator() {
        let mut c = Category::new("align");
        for mem in [100.0, 150.0, 120.0, 180.0, 200.0] {
            c.add_measurement(measurement(mem, 60.0, true));
        }
        let bound = c
            .estimate_upper_bound(Dimension::Memory, 0.95, &WeibullEstimator)
            .unwrap();
        assert!(bound >= 200.0);

        // Identical wall times have no finite Weibull fit
        assert_eq!(
            c.estimate_upper_bound(Dimension::WallTime, 0.95, &WeibullEstimator),
            Err(FitError::Degenerate)
        );
    }

    #[test]
    fn test_identity_is_name() {
        let mut a = Category::new("align");
        a.add_measurement(measurement(1.0, 1.0, true));
        let b = Category::new("align");
        assert_eq!(a, b);
        assert_ne!(a, Category::new("sort"));
    }

    #[test]
    fn test_compare_by_volume() {
        let mut big = Category::new("big");
        let mut small = Category::new("small");
        for _ in 0..3 {
            big.add_measurement(measurement(1.0, 1.0, true));
        }
        small.add_measurement(measurement(1.0, 1.0, true));

        let mut cats = vec![small.clone(), big.clone()];
        cats.sort_by(compare_by_volume);
        assert_eq!(cats[0].name(), "big");

        // Equal submissions: more successes ranks first
        let mut flaky = Category::new("flaky");
        flaky.add_measurement(measurement(1.0, 1.0, false));
        assert_eq!(compare_by_volume(&small, &flaky), Ordering::Less);
    }
}
