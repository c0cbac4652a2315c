//! Escalating retry schedules.
//!
//! # Algorithm
//!
//! For an estimate `e` and clamp ceiling `c`:
//!
//! ```text
//! repeats = min(MAX_RETRIES, ceil(c / e))
//! allocation(attempt) = attempt × e   if attempt < repeats
//!                       c             otherwise
//! ```
//!
//! `repeats` is the number of linear steps needed to reach the ceiling.
//! When every dimension reaches its ceiling in fewer than `MAX_RETRIES`
//! steps, the category's retry count is lowered to match: further retries
//! would request the same capped allocation again.

use serde::{Deserialize, Serialize};

use crate::models::{ClampRanges, Dimension, EstimatedResources};
use crate::optimizer::EstimationReport;

/// System-wide maximum number of retries.
pub const MAX_RETRIES: u32 = 3;

/// Exit statuses that indicate resource exhaustion or external signals.
///
/// 104, 134, 137, 139, 140, 143: connection reset, SIGABRT, SIGKILL,
/// SIGSEGV, scheduler limit kill, SIGTERM.
pub const DEFAULT_RETRY_EXIT_STATUSES: [i32; 6] = [140, 143, 137, 104, 134, 139];

/// Global retry defaults applied to every process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessDefaults {
    /// Default maximum retries.
    pub max_retries: u32,
    /// Exit statuses that trigger a retry; all others finish.
    pub retry_exit_statuses: Vec<i32>,
}

impl Default for ProcessDefaults {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            retry_exit_statuses: DEFAULT_RETRY_EXIT_STATUSES.to_vec(),
        }
    }
}

/// Attempt-indexed allocation for one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EscalationRule {
    /// Dimension this rule allocates.
    pub dimension: Dimension,
    /// Allocation per attempt before the ceiling is reached (whole units).
    pub step: f64,
    /// Allocation once `attempt >= repeats`.
    pub ceiling: f64,
    /// First attempt that receives the ceiling.
    pub repeats: u32,
}

impl EscalationRule {
    /// Builds the rule for an estimate.
    ///
    /// Without a ceiling the rule escalates linearly for [`MAX_RETRIES`]
    /// attempts and then holds at `MAX_RETRIES × step`. Returns `None` for
    /// a non-positive or non-finite estimate.
    pub fn new(dimension: Dimension, estimate: f64, ceiling: Option<f64>) -> Option<Self> {
        if !estimate.is_finite() || estimate <= 0.0 {
            return None;
        }
        let step = estimate.ceil();
        let (repeats, ceiling) = match ceiling {
            Some(c) => {
                let steps = (c / estimate).ceil();
                let repeats = if steps >= MAX_RETRIES as f64 {
                    MAX_RETRIES
                } else {
                    steps.max(1.0) as u32
                };
                (repeats, c)
            }
            None => (MAX_RETRIES, MAX_RETRIES as f64 * step),
        };
        Some(Self {
            dimension,
            step,
            ceiling,
            repeats,
        })
    }

    /// Allocation for a 1-based attempt number.
    pub fn allocation(&self, attempt: u32) -> f64 {
        if attempt < self.repeats {
            attempt as f64 * self.step
        } else {
            self.ceiling
        }
    }
}

/// Retry policy for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPolicy {
    /// Category name.
    pub category: String,
    /// Memory schedule, if memory was estimated.
    pub memory: Option<EscalationRule>,
    /// Wall time schedule, if wall time was estimated.
    pub wall_time: Option<EscalationRule>,
    /// Retry override; `None` means the global default applies.
    pub max_retries: Option<u32>,
}

impl CategoryPolicy {
    /// Rule for a dimension.
    pub fn rule(&self, dim: Dimension) -> Option<&EscalationRule> {
        match dim {
            Dimension::Memory => self.memory.as_ref(),
            Dimension::WallTime => self.wall_time.as_ref(),
        }
    }

    /// Retry count in effect for this category.
    pub fn effective_max_retries(&self, defaults: &ProcessDefaults) -> u32 {
        self.max_retries.unwrap_or(defaults.max_retries)
    }
}

/// Derives per-category escalation schedules from estimates.
///
/// # Example
///
/// ```
/// use u_allocate::models::{ClampRanges, EstimatedResources};
/// use u_allocate::policy::PolicyGenerator;
///
/// let clamp = ClampRanges::none().with_memory(500.0, 1000.0);
/// let estimate = EstimatedResources { memory: Some(600.0), wall_time: None };
///
/// let policy = PolicyGenerator::new(clamp).generate_one("align", &estimate).unwrap();
/// let memory = policy.memory.unwrap();
/// assert_eq!(memory.repeats, 2);
/// assert_eq!(memory.allocation(1), 600.0);
/// assert_eq!(memory.allocation(2), 1000.0);
/// assert_eq!(policy.max_retries, Some(2));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PolicyGenerator {
    clamp: ClampRanges,
}

impl PolicyGenerator {
    /// Creates a generator for the given clamp ranges.
    pub fn new(clamp: ClampRanges) -> Self {
        Self { clamp }
    }

    /// Builds the policy for one category.
    ///
    /// Returns `None` when no dimension carries a usable estimate.
    pub fn generate_one(
        &self,
        category: impl Into<String>,
        estimate: &EstimatedResources,
    ) -> Option<CategoryPolicy> {
        let rule = |dim: Dimension| {
            estimate.get(dim).and_then(|value| {
                EscalationRule::new(dim, value, self.clamp.get(dim).map(|r| r.max))
            })
        };
        let memory = rule(Dimension::Memory);
        let wall_time = rule(Dimension::WallTime);

        let max_repeats = memory.iter().chain(wall_time.iter()).map(|r| r.repeats).max()?;
        Some(CategoryPolicy {
            category: category.into(),
            memory,
            wall_time,
            max_retries: (max_repeats < MAX_RETRIES).then_some(max_repeats),
        })
    }

    /// Builds policies for every estimate in a report, in report order.
    pub fn generate(&self, report: &EstimationReport<'_>) -> Vec<CategoryPolicy> {
        report
            .estimates
            .iter()
            .filter_map(|e| self.generate_one(e.category.name(), &e.resources))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Measurement, Resources};
    use crate::optimizer::Optimizer;

    #[test]
    fn test_rule_three_steps() {
        let rule = EscalationRule::new(Dimension::Memory, 100.0, Some(1000.0)).unwrap();
        assert_eq!(rule.repeats, 3);
        assert_eq!(rule.allocation(1), 100.0);
        assert_eq!(rule.allocation(2), 200.0);
        assert_eq!(rule.allocation(3), 1000.0);
        assert_eq!(rule.allocation(10), 1000.0);
    }

    #[test]
    fn test_rule_reaches_ceiling_early() {
        let rule = EscalationRule::new(Dimension::WallTime, 1000.0, Some(1000.0)).unwrap();
        assert_eq!(rule.repeats, 1);
        assert_eq!(rule.allocation(1), 1000.0);

        let rule = EscalationRule::new(Dimension::WallTime, 600.0, Some(1000.0)).unwrap();
        assert_eq!(rule.repeats, 2);
    }

    #[test]
    fn test_rule_step_rounded_up() {
        let rule = EscalationRule::new(Dimension::Memory, 249.6, Some(124_000.0)).unwrap();
        assert_eq!(rule.step, 250.0);
        assert_eq!(rule.allocation(2), 500.0);
    }

    #[test]
    fn test_rule_without_ceiling() {
        let rule = EscalationRule::new(Dimension::Memory, 100.0, None).unwrap();
        assert_eq!(rule.repeats, MAX_RETRIES);
        assert_eq!(rule.allocation(2), 200.0);
        assert_eq!(rule.allocation(3), 300.0);
    }

    #[test]
    fn test_rule_rejects_non_positive() {
        assert!(EscalationRule::new(Dimension::WallTime, 0.0, Some(100.0)).is_none());
        assert!(EscalationRule::new(Dimension::WallTime, f64::NAN, None).is_none());
    }

    #[test]
    fn test_monotone_until_ceiling() {
        for estimate in [50.0, 120.0, 333.0, 499.0, 500.0, 999.0] {
            let rule = EscalationRule::new(Dimension::Memory, estimate, Some(1000.0)).unwrap();
            let mut prev = 0.0;
            for attempt in 1..rule.repeats {
                let a = rule.allocation(attempt);
                assert!(a > prev);
                assert!(a <= 1000.0);
                prev = a;
            }
            for attempt in rule.repeats..rule.repeats + 5 {
                assert_eq!(rule.allocation(attempt), 1000.0);
            }
        }
    }

    #[test]
    fn test_max_retries_is_max_of_repeats() {
        let clamp = ClampRanges::none()
            .with_memory(0.0, 1000.0)
            .with_wall_time(0.0, 3600.0);
        let generator = PolicyGenerator::new(clamp);

        // memory repeats 1, wall time repeats 2
        let est = EstimatedResources {
            memory: Some(1000.0),
            wall_time: Some(1800.0),
        };
        assert_eq!(generator.generate_one("x", &est).unwrap().max_retries, Some(2));

        // wall time repeats 3: global default applies
        let est = EstimatedResources {
            memory: Some(1000.0),
            wall_time: Some(600.0),
        };
        let policy = generator.generate_one("x", &est).unwrap();
        assert_eq!(policy.max_retries, None);
        assert_eq!(policy.effective_max_retries(&ProcessDefaults::default()), 3);
    }

    #[test]
    fn test_no_dimensions_no_policy() {
        let generator = PolicyGenerator::new(ClampRanges::none().with_memory(0.0, 10.0));
        assert!(generator
            .generate_one("x", &EstimatedResources::default())
            .is_none());
    }

    #[test]
    fn test_partial_policy() {
        let generator = PolicyGenerator::new(ClampRanges::none().with_memory(0.0, 1000.0));
        let est = EstimatedResources {
            memory: None,
            wall_time: Some(120.0),
        };
        let policy = generator.generate_one("x", &est).unwrap();
        assert!(policy.rule(Dimension::Memory).is_none());
        assert_eq!(policy.rule(Dimension::WallTime).unwrap().repeats, 3);
    }

    #[test]
    fn test_generate_from_report() {
        let mut opt = Optimizer::new(0.95, 1.0);
        opt.add_measurement(Measurement::new("a", "", Resources::new(300.0, 600.0), true));
        opt.add_measurement(Measurement::new("b", "", Resources::new(10.0, 10.0), false));
        let clamp = ClampRanges::none()
            .with_memory(500.0, 1000.0)
            .with_wall_time(300.0, 3600.0);

        let report = opt.estimate_all(&clamp);
        let policies = PolicyGenerator::new(clamp).generate(&report);
        assert_eq!(policies.len(), 1);

        // memory 2 × 300 = 600 → repeats 2; wall time 2 × 600 = 1200 → repeats 3
        let a = &policies[0];
        assert_eq!(a.category, "a");
        assert_eq!(a.memory.unwrap().repeats, 2);
        assert_eq!(a.wall_time.unwrap().repeats, 3);
        assert_eq!(a.max_retries, None);
    }
}
