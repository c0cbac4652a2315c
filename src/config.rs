//! Estimator configuration (TOML).
//!
//! Every field is optional in the file; missing fields take the defaults
//! below.
//!
//! ```toml
//! confidence = 0.95
//! multiplier = 1.2
//! skip-duration = 10.0
//!
//! [clamp.memory]
//! min = 500.0
//! max = 124000.0
//!
//! [clamp.wall-time]
//! min = 300.0
//! max = 172800.0
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::ingest::{ProjectCollector, DEFAULT_SKIP_DURATION_SECS};
use crate::models::ClampRanges;
use crate::optimizer::{Optimizer, DEFAULT_CONFIDENCE, DEFAULT_MULTIPLIER};
use crate::validation::{validate_config, ValidationError, ValidationResult};

/// Default memory clamp (MB).
pub const DEFAULT_MEMORY_RANGE: (f64, f64) = (500.0, 124_000.0);

/// Default wall-time clamp (seconds): 5 minutes to 48 hours.
pub const DEFAULT_WALL_TIME_RANGE: (f64, f64) = (300.0, 172_800.0);

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values failed validation.
    #[error("invalid config: {}", join(.0))]
    Invalid(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ValidationError::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Estimation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Upper-bound confidence level in (0, 1).
    pub confidence: f64,
    /// Safety multiplier applied to every estimate.
    pub multiplier: f64,
    /// Per-dimension clamp ranges.
    pub clamp: ClampRanges,
    /// Log-derived tasks at or under this wall time (seconds) are dropped.
    #[serde(rename = "skip-duration")]
    pub skip_duration_secs: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            confidence: DEFAULT_CONFIDENCE,
            multiplier: DEFAULT_MULTIPLIER,
            clamp: ClampRanges::none()
                .with_memory(DEFAULT_MEMORY_RANGE.0, DEFAULT_MEMORY_RANGE.1)
                .with_wall_time(DEFAULT_WALL_TIME_RANGE.0, DEFAULT_WALL_TIME_RANGE.1),
            skip_duration_secs: DEFAULT_SKIP_DURATION_SECS,
        }
    }
}

impl EstimatorConfig {
    /// Loads and validates a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Checks all values. See [`validate_config`].
    pub fn validate(&self) -> ValidationResult {
        validate_config(self)
    }

    /// An empty optimizer using this confidence and multiplier.
    pub fn optimizer(&self) -> Optimizer {
        Optimizer::new(self.confidence, self.multiplier)
    }

    /// Applies this skip duration to a collector.
    pub fn collector(&self, collector: ProjectCollector) -> ProjectCollector {
        collector.with_skip_duration(self.skip_duration_secs)
    }
}
