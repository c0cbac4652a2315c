//! Resource vectors over a closed set of dimensions.
//!
//! Every observation and every estimate is expressed over the same two
//! dimensions: peak memory (MB) and wall-clock time (seconds). Three shapes
//! exist:
//!
//! - [`Resources`]: fully specified, one value per dimension.
//! - [`PartialResources`]: as read from an external record, where a
//!   dimension may be missing. Converting it into [`Resources`] fails if
//!   any dimension is absent.
//! - [`EstimatedResources`]: the optimizer output, where a dimension may be
//!   unavailable because it could not be estimated safely.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A resource dimension tracked by the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dimension {
    /// Peak resident memory in megabytes.
    Memory,
    /// Wall-clock runtime in seconds.
    WallTime,
}

impl Dimension {
    /// All dimensions, in a fixed order.
    pub const ALL: [Dimension; 2] = [Dimension::Memory, Dimension::WallTime];

    /// Canonical name (`memory`, `wall-time`).
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::WallTime => "wall-time",
        }
    }

    /// Unit suffix used in log output.
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Memory => "MB",
            Self::WallTime => "s",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Construction errors for resource records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeasurementError {
    /// A required dimension was not supplied.
    #[error("must define all required resources ({0} missing)")]
    MissingDimension(Dimension),
}

/// A complete resource vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Resources {
    /// Memory (MB).
    pub memory: f64,
    /// Wall time (seconds).
    #[serde(rename = "wall-time")]
    pub wall_time: f64,
}

impl Resources {
    /// Creates a resource vector.
    pub fn new(memory: f64, wall_time: f64) -> Self {
        Self { memory, wall_time }
    }

    /// Value for a dimension.
    #[inline]
    pub fn get(&self, dim: Dimension) -> f64 {
        match dim {
            Dimension::Memory => self.memory,
            Dimension::WallTime => self.wall_time,
        }
    }

    /// Mutable access to a dimension.
    #[inline]
    pub fn get_mut(&mut self, dim: Dimension) -> &mut f64 {
        match dim {
            Dimension::Memory => &mut self.memory,
            Dimension::WallTime => &mut self.wall_time,
        }
    }
}

/// A resource vector whose dimensions may be missing.
///
/// This is the shape external records arrive in. It never reaches the
/// estimator directly; [`Resources::try_from`] rejects incomplete records.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PartialResources {
    /// Memory (MB), if recorded.
    pub memory: Option<f64>,
    /// Wall time (seconds), if recorded.
    #[serde(rename = "wall-time")]
    pub wall_time: Option<f64>,
}

impl PartialResources {
    /// Sets the memory value.
    pub fn with_memory(mut self, memory: f64) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Sets the wall time value.
    pub fn with_wall_time(mut self, wall_time: f64) -> Self {
        self.wall_time = Some(wall_time);
        self
    }
}

impl TryFrom<PartialResources> for Resources {
    type Error = MeasurementError;

    fn try_from(partial: PartialResources) -> Result<Self, Self::Error> {
        let memory = partial
            .memory
            .ok_or(MeasurementError::MissingDimension(Dimension::Memory))?;
        let wall_time = partial
            .wall_time
            .ok_or(MeasurementError::MissingDimension(Dimension::WallTime))?;
        Ok(Self { memory, wall_time })
    }
}

/// Estimated allocation per dimension.
///
/// `None` marks a dimension that could not be estimated safely; no
/// directive is emitted for it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EstimatedResources {
    /// Memory estimate (MB).
    pub memory: Option<f64>,
    /// Wall time estimate (seconds).
    #[serde(rename = "wall-time")]
    pub wall_time: Option<f64>,
}

impl EstimatedResources {
    /// Value for a dimension.
    #[inline]
    pub fn get(&self, dim: Dimension) -> Option<f64> {
        match dim {
            Dimension::Memory => self.memory,
            Dimension::WallTime => self.wall_time,
        }
    }

    /// Sets or clears a dimension.
    #[inline]
    pub fn set(&mut self, dim: Dimension, value: Option<f64>) {
        match dim {
            Dimension::Memory => self.memory = value,
            Dimension::WallTime => self.wall_time = value,
        }
    }

    /// Whether no dimension carries a value.
    pub fn is_empty(&self) -> bool {
        self.memory.is_none() && self.wall_time.is_none()
    }
}

/// Administrator-imposed `[min, max]` bounds for one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClampRange {
    /// Lower bound (inclusive).
    pub min: f64,
    /// Upper bound (inclusive).
    pub max: f64,
}

impl ClampRange {
    /// Creates a clamp range.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether a value lies within `[min, max]`.
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Clamp ranges per dimension. Dimensions without a range are not clamped.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClampRanges {
    /// Memory bounds (MB).
    pub memory: Option<ClampRange>,
    /// Wall time bounds (seconds).
    #[serde(rename = "wall-time")]
    pub wall_time: Option<ClampRange>,
}

impl ClampRanges {
    /// No clamping on either dimension.
    pub fn none() -> Self {
        Self::default()
    }

    /// Sets the memory range.
    pub fn with_memory(mut self, min: f64, max: f64) -> Self {
        self.memory = Some(ClampRange::new(min, max));
        self
    }

    /// Sets the wall time range.
    pub fn with_wall_time(mut self, min: f64, max: f64) -> Self {
        self.wall_time = Some(ClampRange::new(min, max));
        self
    }

    /// Range for a dimension, if configured.
    #[inline]
    pub fn get(&self, dim: Dimension) -> Option<ClampRange> {
        match dim {
            Dimension::Memory => self.memory,
            Dimension::WallTime => self.wall_time,
        }
    }
}
