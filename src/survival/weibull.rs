//! Two-parameter Weibull fit with right-censoring.
//!
//! # Model
//!
//! Survival function `S(t) = exp(-(t/λ)^k)` with shape `k > 0` and
//! scale `λ > 0`. With `r` events among `n` observations, the
//! log-likelihood is
//!
//! ```text
//! ℓ(k, λ) = r·ln k − r·k·ln λ + (k−1)·Σ_events ln tᵢ − Σ_all (tᵢ/λ)^k
//! ```
//!
//! For fixed `k` the maximizing scale is `λ^k = Σ_all tᵢ^k / r`. Substituting
//! it yields the profile score equation in `k` alone:
//!
//! ```text
//! g(k) = Σ tᵢ^k ln tᵢ / Σ tᵢ^k − 1/k − (1/r)·Σ_events ln tᵢ = 0
//! ```
//!
//! `g` is strictly increasing (its derivative is a weighted variance of
//! `ln t` plus `1/k²`), tends to `−∞` as `k → 0`, and tends to
//! `max ln t − mean_events ln t` as `k → ∞`. A finite root therefore exists
//! iff some event lies strictly below the sample maximum, and bisection on
//! a doubled bracket finds it deterministically.
//!
//! Values are divided by their maximum before solving so that every
//! `tᵢ^k ≤ 1` and no power overflows.
//!
//! # Reference
//! Cohen (1965), "Maximum Likelihood Estimation in the Weibull Distribution
//! Based on Complete and on Censored Samples", Technometrics 7(4).

use super::{FitError, QuantileEstimator};

/// Substitute for zero-valued observations (the model is undefined at 0).
pub const ZERO_EPSILON: f64 = 1e-4;

const INITIAL_SHAPE: f64 = 1.0;
const MIN_SHAPE: f64 = 1e-6;
const MAX_SHAPE: f64 = 1e6;
const MAX_ITERATIONS: usize = 200;
const RELATIVE_TOLERANCE: f64 = 1e-12;
const DEGENERATE_TOLERANCE: f64 = 1e-12;

/// Fitted Weibull parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeibullFit {
    /// Shape parameter `k`.
    pub shape: f64,
    /// Scale parameter `λ`, in the units of the input values.
    pub scale: f64,
}

impl WeibullFit {
    /// Creates a distribution from known parameters.
    pub fn new(shape: f64, scale: f64) -> Self {
        Self { shape, scale }
    }

    /// Maximum-likelihood fit to right-censored observations.
    ///
    /// `observed[i]` is `true` for an event (exact value) and `false` for a
    /// censored value (true value at least `values[i]`). Zeros are replaced
    /// by [`ZERO_EPSILON`].
    ///
    /// # Errors
    /// - [`FitError::Empty`], [`FitError::LengthMismatch`],
    ///   [`FitError::InvalidValue`] for malformed input.
    /// - [`FitError::NoEvents`] if every observation is censored.
    /// - [`FitError::Degenerate`] if no event lies below the sample maximum
    ///   (this includes all-identical samples).
    /// - [`FitError::NoConvergence`] if the shape exceeds the solver range.
    pub fn fit(values: &[f64], observed: &[bool]) -> Result<Self, FitError> {
        if values.is_empty() {
            return Err(FitError::Empty);
        }
        if values.len() != observed.len() {
            return Err(FitError::LengthMismatch {
                values: values.len(),
                observed: observed.len(),
            });
        }
        if let Some(&bad) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(FitError::InvalidValue(bad));
        }

        let events = observed.iter().filter(|&&e| e).count();
        if events == 0 {
            return Err(FitError::NoEvents);
        }

        let times: Vec<f64> = values
            .iter()
            .map(|&v| if v > 0.0 { v } else { ZERO_EPSILON })
            .collect();
        let t_max = times.iter().copied().fold(f64::MIN, f64::max);
        let logs: Vec<f64> = times.iter().map(|t| (t / t_max).ln()).collect();

        let mean_event_log = logs
            .iter()
            .zip(observed)
            .filter(|(_, &event)| event)
            .map(|(l, _)| *l)
            .sum::<f64>()
            / events as f64;

        // Limit of g(k) as k → ∞ (max log is 0 after rescaling)
        if -mean_event_log <= DEGENERATE_TOLERANCE {
            return Err(FitError::Degenerate);
        }

        let score = |k: f64| -> f64 {
            let (s0, s1) = logs.iter().fold((0.0, 0.0), |(s0, s1), &l| {
                let w = (k * l).exp();
                (s0 + w, s1 + w * l)
            });
            s1 / s0 - 1.0 / k - mean_event_log
        };

        // Bracket the root: g(lo) < 0 <= g(hi)
        let mut lo = MIN_SHAPE;
        let mut hi = INITIAL_SHAPE;
        while score(hi) < 0.0 {
            lo = hi;
            hi *= 2.0;
            if hi > MAX_SHAPE {
                return Err(FitError::NoConvergence);
            }
        }

        for _ in 0..MAX_ITERATIONS {
            if hi - lo <= RELATIVE_TOLERANCE * hi {
                break;
            }
            let mid = 0.5 * (lo + hi);
            if score(mid) < 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        let shape = 0.5 * (lo + hi);
        let sum_pow: f64 = logs.iter().map(|&l| (shape * l).exp()).sum();
        let scale = t_max * (sum_pow / events as f64).powf(1.0 / shape);

        if !shape.is_finite() || !scale.is_finite() || scale <= 0.0 {
            return Err(FitError::NoConvergence);
        }

        Ok(Self { shape, scale })
    }

    /// Survival probability `P(T > t)`.
    pub fn survival(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 1.0;
        }
        (-(t / self.scale).powf(self.shape)).exp()
    }

    /// Time at which the survival function equals `p`.
    ///
    /// `percentile(0.05)` is the value exceeded by only 5% of executions.
    pub fn percentile(&self, p: f64) -> Result<f64, FitError> {
        if !(p > 0.0 && p < 1.0) {
            return Err(FitError::InvalidProbability(p));
        }
        Ok(self.scale * (-p.ln()).powf(1.0 / self.shape))
    }

    /// Log-likelihood of right-censored observations under this model.
    ///
    /// Zeros are replaced by [`ZERO_EPSILON`], matching [`WeibullFit::fit`].
    pub fn log_likelihood(&self, values: &[f64], observed: &[bool]) -> f64 {
        let (k, lambda) = (self.shape, self.scale);
        values
            .iter()
            .zip(observed)
            .map(|(&v, &event)| {
                let t = if v > 0.0 { v } else { ZERO_EPSILON };
                let z = (t / lambda).powf(k);
                if event {
                    k.ln() - lambda.ln() + (k - 1.0) * (t / lambda).ln() - z
                } else {
                    -z
                }
            })
            .sum()
    }
}

/// Default [`QuantileEstimator`]: Weibull MLE, bound rounded up to an integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeibullEstimator;

impl QuantileEstimator for WeibullEstimator {
    fn name(&self) -> &'static str {
        "weibull"
    }

    fn upper_bound(
        &self,
        values: &[f64],
        observed: &[bool],
        confidence: f64,
    ) -> Result<f64, FitError> {
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(FitError::InvalidProbability(confidence));
        }
        let fit = WeibullFit::fit(values, observed)?;
        Ok(fit.percentile(1.0 - confidence)?.ceil())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn sample_weibull(rng: &mut SmallRng, shape: f64, scale: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|_| {
                let u: f64 = rng.random::<f64>().max(1e-12);
                scale * (-u.ln()).powf(1.0 / shape)
            })
            .collect()
    }

    #[test]
    fn test_recovers_parameters_uncensored() {
        let mut rng = SmallRng::seed_from_u64(42);
        let values = sample_weibull(&mut rng, 3.0, 500.0, 2000);
        let observed = vec![true; values.len()];

        let fit = WeibullFit::fit(&values, &observed).unwrap();
        assert!((fit.shape - 3.0).abs() < 0.3, "shape {}", fit.shape);
        assert!((fit.scale - 500.0).abs() < 25.0, "scale {}", fit.scale);
    }

    #[test]
    fn test_recovers_parameters_with_censoring() {
        // Censor every value above 600 at 600 (resource limit kills the task)
        let mut rng = SmallRng::seed_from_u64(7);
        let raw = sample_weibull(&mut rng, 2.0, 500.0, 3000);
        let values: Vec<f64> = raw.iter().map(|&v| v.min(600.0)).collect();
        let observed: Vec<bool> = raw.iter().map(|&v| v <= 600.0).collect();

        let fit = WeibullFit::fit(&values, &observed).unwrap();
        assert!((fit.shape - 2.0).abs() < 0.25, "shape {}", fit.shape);
        assert!((fit.scale - 500.0).abs() < 30.0, "scale {}", fit.scale);
    }

    #[test]
    fn test_fit_maximizes_likelihood() {
        let values = [100.0, 150.0, 120.0, 180.0, 200.0, 90.0];
        let observed = [true, true, true, true, false, true];
        let fit = WeibullFit::fit(&values, &observed).unwrap();
        let best = fit.log_likelihood(&values, &observed);

        for (dk, dl) in [(0.05, 0.0), (-0.05, 0.0), (0.0, 1.0), (0.0, -1.0)] {
            let other = WeibullFit::new(fit.shape * (1.0 + dk), fit.scale + dl);
            assert!(other.log_likelihood(&values, &observed) <= best + 1e-9);
        }
    }

    #[test]
    fn test_censoring_raises_estimate() {
        let values = [100.0, 150.0, 120.0, 180.0, 200.0];
        let all_events = [true; 5];
        let one_censored = [true, true, true, true, false];

        let est = WeibullEstimator;
        let a = est.upper_bound(&values, &all_events, 0.95).unwrap();
        let b = est.upper_bound(&values, &one_censored, 0.95).unwrap();
        assert!(b > a, "censored {b} vs uncensored {a}");
    }

    #[test]
    fn test_upper_bound_above_sample_maximum() {
        let est = WeibullEstimator;
        let bound = est
            .upper_bound(&[100.0, 150.0, 120.0, 180.0, 200.0], &[true; 5], 0.95)
            .unwrap();
        assert!(bound >= 200.0);
        assert!(bound < 300.0);
        assert_eq!(bound, bound.ceil());
    }

    #[test]
    fn test_higher_confidence_higher_bound() {
        let values = [30.0, 45.0, 60.0, 40.0, 55.0, 70.0];
        let observed = [true; 6];
        let est = WeibullEstimator;
        let b90 = est.upper_bound(&values, &observed, 0.90).unwrap();
        let b99 = est.upper_bound(&values, &observed, 0.99).unwrap();
        assert!(b99 > b90);
    }

    #[test]
    fn test_survival_and_percentile_agree() {
        let fit = WeibullFit::new(2.5, 300.0);
        let t = fit.percentile(0.05).unwrap();
        assert!((fit.survival(t) - 0.05).abs() < 1e-12);
        assert!((fit.survival(0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_values_use_epsilon() {
        let fit = WeibullFit::fit(&[0.0, 10.0, 20.0, 15.0], &[true; 4]).unwrap();
        assert!(fit.shape.is_finite());
        assert!(fit.scale > 0.0);
    }

    #[test]
    fn test_identical_values_degenerate() {
        assert_eq!(
            WeibullFit::fit(&[100.0, 100.0, 100.0], &[true; 3]),
            Err(FitError::Degenerate)
        );
    }

    #[test]
    fn test_event_only_at_maximum_degenerate() {
        assert_eq!(
            WeibullFit::fit(&[100.0, 200.0], &[false, true]),
            Err(FitError::Degenerate)
        );
    }

    #[test]
    fn test_all_censored() {
        assert_eq!(
            WeibullFit::fit(&[100.0, 200.0], &[false, false]),
            Err(FitError::NoEvents)
        );
    }

    #[test]
    fn test_malformed_input() {
        assert_eq!(WeibullFit::fit(&[], &[]), Err(FitError::Empty));
        assert_eq!(
            WeibullFit::fit(&[1.0, 2.0], &[true]),
            Err(FitError::LengthMismatch { values: 2, observed: 1 })
        );
        assert!(matches!(
            WeibullFit::fit(&[1.0, -2.0], &[true, true]),
            Err(FitError::InvalidValue(_))
        ));
        assert!(matches!(
            WeibullEstimator.upper_bound(&[1.0, 2.0], &[true, true], 1.0),
            Err(FitError::InvalidProbability(_))
        ));
    }

    #[test]
    fn test_deterministic() {
        let values = [12.0, 18.0, 9.0, 30.0, 22.0, 17.0];
        let observed = [true, true, false, true, true, false];
        let a = WeibullFit::fit(&values, &observed).unwrap();
        let b = WeibullFit::fit(&values, &observed).unwrap();
        assert_eq!(a, b);
    }
}
