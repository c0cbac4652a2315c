//! Resource allocation from historical task usage.
//!
//! Estimates memory and wall-time requests for batch job classes from past
//! executions and turns them into escalating retry policies for a workflow
//! engine. Observations of failed jobs are treated as right-censored: the
//! job needed at least what it used, possibly more.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Measurement`, `Category`, `Subcategory`,
//!   `Resources`, `EstimatedResources`, `ClampRanges`
//! - **`survival`**: Censored Weibull fitting behind the `QuantileEstimator` trait
//! - **`optimizer`**: Measurement registry and the estimate/multiply/clamp pipeline
//! - **`policy`**: Escalating retry rules and Nextflow config rendering
//! - **`ingest`**: `nextflow log` parsing, PBS Pro accounting, per-project cache
//! - **`units`**: Memory and duration string conversions
//! - **`config`**: TOML estimator settings
//! - **`validation`**: Configuration checks (collect-all)
//!
//! # Pipeline
//!
//! ```text
//! ingest ──► Measurement ──► Optimizer ──► EstimationReport ──► PolicyGenerator ──► config text
//!                               │
//!                               └── QuantileEstimator (Weibull, censored)
//! ```
//!
//! # References
//!
//! - Klein & Moeschberger (2003), "Survival Analysis: Techniques for Censored
//!   and Truncated Data", Ch. 3 (right censoring)
//! - Lawless (2003), "Statistical Models and Methods for Lifetime Data", Ch. 5
//!   (Weibull maximum likelihood)

pub mod config;
pub mod ingest;
pub mod models;
pub mod optimizer;
pub mod policy;
pub mod survival;
pub mod units;
pub mod validation;
