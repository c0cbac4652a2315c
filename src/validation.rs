//! Configuration validation.
//!
//! Checks estimator settings before any data is collected. Detects:
//! - Confidence levels outside the open interval (0, 1)
//! - Non-positive or non-finite multipliers
//! - Inverted, negative or non-finite clamp ranges
//! - Wall-time ranges that contain no whole minute
//! - Negative or non-finite skip durations
//!
//! All problems are reported at once rather than stopping at the first.

use crate::config::EstimatorConfig;
use crate::models::{ClampRange, Dimension};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Confidence is not strictly between 0 and 1.
    InvalidConfidence,
    /// Multiplier is not a positive finite number.
    InvalidMultiplier,
    /// A clamp range is negative, inverted or not finite.
    InvalidClampRange,
    /// A wall-time clamp range contains no multiple of 60 seconds.
    NoWholeMinuteInRange,
    /// Skip duration is negative or not finite.
    InvalidSkipDuration,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Validates estimator settings.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_config(config: &EstimatorConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if !(config.confidence > 0.0 && config.confidence < 1.0) {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidConfidence,
            format!("Confidence must lie in (0, 1), got {}", config.confidence),
        ));
    }

    if !(config.multiplier.is_finite() && config.multiplier > 0.0) {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidMultiplier,
            format!("Multiplier must be positive, got {}", config.multiplier),
        ));
    }

    for dim in Dimension::ALL {
        if let Some(range) = config.clamp.get(dim) {
            validate_range(dim, range, &mut errors);
        }
    }

    if !(config.skip_duration_secs.is_finite() && config.skip_duration_secs >= 0.0) {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidSkipDuration,
            format!(
                "Skip duration must be non-negative, got {}",
                config.skip_duration_secs
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_range(dim: Dimension, range: ClampRange, errors: &mut Vec<ValidationError>) {
    let ClampRange { min, max } = range;
    if !(min.is_finite() && max.is_finite()) || min < 0.0 || min > max {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidClampRange,
            format!("Invalid {dim} range [{min}, {max}]"),
        ));
        return;
    }

    // Wall-time allocations are whole minutes.
    if dim == Dimension::WallTime && (min / 60.0).ceil() * 60.0 > max {
        errors.push(ValidationError::new(
            ValidationErrorKind::NoWholeMinuteInRange,
            format!("Wall-time range [{min}, {max}] contains no whole minute"),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClampRanges;

    #[test]
    fn test_default_config_valid() {
        assert!(validate_config(&EstimatorConfig::default()).is_ok());
    }

    #[test]
    fn test_unclamped_config_valid() {
        let config = EstimatorConfig {
            clamp: ClampRanges::none(),
            ..EstimatorConfig::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_confidence_bounds() {
        for confidence in [0.0, 1.0, -0.5, f64::NAN] {
            let config = EstimatorConfig {
                confidence,
                ..EstimatorConfig::default()
            };
            let errors = validate_config(&config).unwrap_err();
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].kind, ValidationErrorKind::InvalidConfidence);
        }
    }

    #[test]
    fn test_invalid_multiplier() {
        for multiplier in [0.0, -1.0, f64::INFINITY] {
            let config = EstimatorConfig {
                multiplier,
                ..EstimatorConfig::default()
            };
            let errors = validate_config(&config).unwrap_err();
            assert!(errors
                .iter()
                .any(|e| e.kind == ValidationErrorKind::InvalidMultiplier));
        }
    }

    #[test]
    fn test_inverted_range() {
        let config = EstimatorConfig {
            clamp: ClampRanges::none().with_memory(1000.0, 500.0),
            ..EstimatorConfig::default()
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].kind, ValidationErrorKind::InvalidClampRange);
        assert!(errors[0].message.contains("memory"));
    }

    #[test]
    fn test_wall_time_range_without_minute() {
        let config = EstimatorConfig {
            clamp: ClampRanges::none().with_wall_time(61.0, 119.0),
            ..EstimatorConfig::default()
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].kind, ValidationErrorKind::NoWholeMinuteInRange);

        let config = EstimatorConfig {
            clamp: ClampRanges::none().with_wall_time(61.0, 120.0),
            ..EstimatorConfig::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_memory_range_needs_no_minute() {
        let config = EstimatorConfig {
            clamp: ClampRanges::none().with_memory(61.0, 119.0),
            ..EstimatorConfig::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_multiple_errors() {
        let config = EstimatorConfig {
            confidence: 2.0,
            multiplier: -1.0,
            clamp: ClampRanges::none().with_memory(-1.0, 10.0),
            skip_duration_secs: -5.0,
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }
}
