//! Measurement model.
//!
//! A measurement is one observed task execution: the job class it belongs
//! to, an optional secondary tag, the resources it consumed and whether it
//! completed successfully. Measurements are immutable once built.

use serde::{Deserialize, Serialize};

use super::{MeasurementError, PartialResources, Resources};

/// One observed task execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    category: String,
    subcategory: String,
    resources: Resources,
    success: bool,
}

impl Measurement {
    /// Creates a measurement from a complete resource vector.
    pub fn new(
        category: impl Into<String>,
        subcategory: impl Into<String>,
        resources: Resources,
        success: bool,
    ) -> Self {
        Self {
            category: category.into(),
            subcategory: subcategory.into(),
            resources,
            success,
        }
    }

    /// Creates a measurement from a possibly incomplete record.
    ///
    /// Fails if memory or wall time is missing.
    pub fn from_partial(
        category: impl Into<String>,
        subcategory: impl Into<String>,
        resources: PartialResources,
        success: bool,
    ) -> Result<Self, MeasurementError> {
        Ok(Self::new(
            category,
            subcategory,
            Resources::try_from(resources)?,
            success,
        ))
    }

    /// Job class name.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Secondary tag (empty if none).
    pub fn subcategory(&self) -> &str {
        &self.subcategory
    }

    /// Observed resources.
    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    /// Whether the execution completed cleanly.
    pub fn is_success(&self) -> bool {
        self.success
    }
}
