//! Measurement acquisition.
//!
//! Collects task resource usage from the outside world and turns it into
//! [`Measurement`](crate::models::Measurement)s:
//!
//! - **`nextflow`**: parses `nextflow log` output (run names and per-task
//!   trace fields) and runs the command in a project directory.
//! - **`pbs`**: reads authoritative usage from PBS Pro accounting
//!   (`qstat -x -f -F json`) behind the [`NativeSource`] trait.
//! - **`cache`**: the per-project JSON cache of previously seen tasks.
//! - **`project`**: merges the three for one project directory.
//!
//! # Merge Rules
//!
//! | Step | Rule |
//! |------|------|
//! | Trace record | Inserted unless the cached entry is native |
//! | Native usage | Overwrites the matched entry, marks it native |
//! | Short task | Non-native entries at or under the skip duration are dropped |

mod cache;
mod nextflow;
mod pbs;
mod project;

pub use cache::{CachedTask, ResourceCache, CACHE_FILE_NAME};
pub use nextflow::{
    is_success_status, parse_run_names, parse_trace, parse_trace_line, NextflowLog, TraceRecord,
    SUCCESS_STATUSES, TRACE_FIELDS,
};
pub use pbs::{parse_qstat_json, NativeSource, NativeUsage, PbsPro, DEFAULT_QSTAT_PATH};
pub use project::{
    clean_project, collect_native_usage, ProjectCollector, ProjectSummary, DEFAULT_SKIP_DURATION_SECS,
};

use std::path::PathBuf;
use thiserror::Error;

use crate::units::UnitError;

/// Errors raised while acquiring measurements.
#[derive(Debug, Error)]
pub enum IngestError {
    /// An external command exited unsuccessfully.
    #[error("command `{command}` failed: {output}")]
    CommandFailed {
        /// Command line that was run.
        command: String,
        /// Captured output.
        output: String,
    },

    /// A trace line lacks a required field.
    #[error("trace line missing field '{0}'")]
    MissingField(&'static str),

    /// A field value could not be converted.
    #[error(transparent)]
    Unit(#[from] UnitError),

    /// Reading or writing a file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Spawning a command failed.
    #[error("could not run `{command}`: {source}")]
    Spawn {
        /// Command line that was attempted.
        command: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
