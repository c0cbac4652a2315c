//! Resource estimation domain models.
//!
//! Provides the data types the estimator aggregates over: observed
//! executions, the job classes they belong to, and the resource vectors
//! that describe both observations and estimates.
//!
//! # Domain Mappings
//!
//! | u-allocate | Nextflow | Snakemake | Slurm |
//! |------------|----------|-----------|-------|
//! | Category | Process | Rule | Job name |
//! | Subcategory | Tag | Wildcards | Array index |
//! | Measurement | Task trace | Benchmark row | `sacct` record |

mod category;
mod measurement;
mod resources;
mod subcategory;

pub use category::{compare_by_volume, Category};
pub use measurement::Measurement;
pub use resources::{
    ClampRange, ClampRanges, Dimension, EstimatedResources, MeasurementError, PartialResources,
    Resources,
};
pub use subcategory::{compare_by_wall_time, wall_time_differential, Subcategory};
