//! `nextflow log` parsing.
//!
//! Two invocations are used per project directory:
//!
//! 1. `nextflow log` lists runs; the run name is the third tab-separated
//!    column of every line after the header.
//! 2. `nextflow log -f <fields> <runs...>` prints one tab-separated line
//!    per task with the columns in [`TRACE_FIELDS`]. A `-` means the field
//!    is absent.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use super::{CachedTask, IngestError};
use crate::units::{nf_memory_to_mb, nf_time_to_seconds};

/// Trace fields requested from `nextflow log`, in column order.
pub const TRACE_FIELDS: [&str; 8] = [
    "hash",
    "native_id",
    "peak_rss",
    "realtime",
    "process",
    "tag",
    "hash",
    "status",
];

/// Task statuses that count as a clean completion.
pub const SUCCESS_STATUSES: [&str; 2] = ["COMPLETED", "CACHED"];

/// Whether a Nextflow task status counts as success.
pub fn is_success_status(status: &str) -> bool {
    SUCCESS_STATUSES.contains(&status)
}

/// One parsed task line.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRecord {
    /// Cache key (`native_id + hash`).
    pub key: String,
    /// Scheduler job ID; empty if the task never reached the scheduler.
    pub native_id: String,
    /// Resources and outcome.
    pub task: CachedTask,
}

/// Extracts run names from plain `nextflow log` output.
pub fn parse_run_names(output: &str) -> Vec<String> {
    output
        .lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| line.split('\t').nth(2))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

fn column<'a>(columns: &[&'a str], name: &str) -> Option<&'a str> {
    TRACE_FIELDS
        .iter()
        .position(|f| *f == name)
        .and_then(|i| columns.get(i).copied())
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "-")
}

/// Parses one `nextflow log -f` line laid out as [`TRACE_FIELDS`].
pub fn parse_trace_line(line: &str) -> Result<TraceRecord, IngestError> {
    let columns: Vec<&str> = line.split('\t').collect();
    let field = |name| column(&columns, name);

    let hash = field("hash").ok_or(IngestError::MissingField("hash"))?;
    let process = field("process").ok_or(IngestError::MissingField("process"))?;
    let status = field("status").ok_or(IngestError::MissingField("status"))?;
    let native_id = field("native_id").unwrap_or_default();

    let memory = field("peak_rss").map(nf_memory_to_mb).transpose()?.unwrap_or(0);
    let wall_time = field("realtime").map(nf_time_to_seconds).transpose()?.unwrap_or(0);

    Ok(TraceRecord {
        key: format!("{native_id}{hash}"),
        native_id: native_id.to_string(),
        task: CachedTask {
            category: process.to_string(),
            subcategory: field("tag").unwrap_or_default().to_string(),
            memory: memory as f64,
            wall_time: wall_time as f64,
            success: is_success_status(status),
            native: false,
        },
    })
}

/// Parses every non-empty line; malformed lines are returned separately.
pub fn parse_trace(output: &str) -> (Vec<TraceRecord>, Vec<IngestError>) {
    let mut records = Vec::new();
    let mut errors = Vec::new();
    for line in output.lines().filter(|l| !l.trim().is_empty()) {
        match parse_trace_line(line) {
            Ok(record) => records.push(record),
            Err(e) => errors.push(e),
        }
    }
    (records, errors)
}

/// Runs `nextflow log` inside project directories.
#[derive(Debug, Clone)]
pub struct NextflowLog {
    program: PathBuf,
}

impl Default for NextflowLog {
    fn default() -> Self {
        Self::new()
    }
}

impl NextflowLog {
    /// Uses `nextflow` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("nextflow"),
        }
    }

    /// Uses a specific executable.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Lists run names recorded in a project directory.
    pub fn run_names(&self, project_dir: &Path) -> Result<Vec<String>, IngestError> {
        let output = self.run(project_dir, &["log".to_string()])?;
        Ok(parse_run_names(&output))
    }

    /// Raw per-task trace output for the given runs.
    pub fn trace(&self, project_dir: &Path, runs: &[String]) -> Result<String, IngestError> {
        let mut args = vec!["log".to_string(), "-f".to_string(), TRACE_FIELDS.join(",")];
        args.extend(runs.iter().cloned());
        self.run(project_dir, &args)
    }

    fn run(&self, dir: &Path, args: &[String]) -> Result<String, IngestError> {
        let command = format!("{} {}", self.program.display(), args.join(" "));
        debug!(dir = %dir.display(), %command, "running");

        let output = Command::new(&self.program)
            .args(args)
            .current_dir(dir)
            .output()
            .map_err(|source| IngestError::Spawn {
                command: command.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let mut text = String::from_utf8_lossy(&output.stdout).to_string();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            Err(IngestError::CommandFailed {
                command,
                output: text,
            })
        }
    }
}
