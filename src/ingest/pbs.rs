//! Native scheduler accounting.
//!
//! Log-derived peak memory is sampled and can miss short spikes; the batch
//! scheduler's own accounting is authoritative when it is available.
//! [`NativeSource`] abstracts over schedulers; [`PbsPro`] reads
//! `qstat -x -f -F json`.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use super::IngestError;
use crate::units::{pbs_memory_to_mb, pbs_walltime_to_seconds};

/// Default location of the PBS Pro `qstat` binary.
pub const DEFAULT_QSTAT_PATH: &str = "/opt/pbs/bin/qstat";

/// Resource usage reported by the scheduler for one job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeUsage {
    /// Memory (MB).
    pub memory: f64,
    /// Wall time (seconds).
    pub wall_time: f64,
}

impl NativeUsage {
    /// Creates a usage record.
    pub fn new(memory: f64, wall_time: f64) -> Self {
        Self { memory, wall_time }
    }
}

/// A batch scheduler that reports per-job resource usage.
pub trait NativeSource: std::fmt::Debug {
    /// Scheduler name (e.g., "pbspro").
    fn name(&self) -> &'static str;

    /// Whether the scheduler is reachable from this host.
    fn is_available(&self) -> bool;

    /// Usage keyed by scheduler job ID.
    fn usage(&self) -> Result<HashMap<String, NativeUsage>, IngestError>;
}

#[derive(Debug, Deserialize)]
struct QstatOutput {
    #[serde(rename = "Jobs", default)]
    jobs: HashMap<String, QstatJob>,
}

#[derive(Debug, Deserialize)]
struct QstatJob {
    #[serde(default)]
    resources_used: Option<HashMap<String, serde_json::Value>>,
}

/// Parses `qstat -x -f -F json` output.
///
/// Jobs without both `walltime` and `mem` in `resources_used` are skipped,
/// as are jobs whose values cannot be parsed.
pub fn parse_qstat_json(json: &str) -> Result<HashMap<String, NativeUsage>, IngestError> {
    let output: QstatOutput = serde_json::from_str(json)?;
    let mut usage = HashMap::new();

    for (job_id, job) in output.jobs {
        let Some(used) = job.resources_used else {
            continue;
        };
        let (Some(walltime), Some(mem)) = (
            used.get("walltime").and_then(|v| v.as_str()),
            used.get("mem").and_then(|v| v.as_str()),
        ) else {
            continue;
        };
        match (pbs_walltime_to_seconds(walltime), pbs_memory_to_mb(mem)) {
            (Ok(seconds), Ok(mb)) => {
                usage.insert(job_id, NativeUsage::new(mb as f64, seconds as f64));
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(job = %job_id, error = %e, "skipping job with unreadable usage");
            }
        }
    }
    Ok(usage)
}

/// PBS Pro accounting via `qstat`.
#[derive(Debug, Clone)]
pub struct PbsPro {
    qstat: PathBuf,
}

impl Default for PbsPro {
    fn default() -> Self {
        Self {
            qstat: PathBuf::from(DEFAULT_QSTAT_PATH),
        }
    }
}

impl PbsPro {
    /// Uses the given `qstat` path.
    pub fn new(qstat: impl Into<PathBuf>) -> Self {
        Self {
            qstat: qstat.into(),
        }
    }

    /// Path to `qstat`.
    pub fn qstat(&self) -> &Path {
        &self.qstat
    }
}

impl NativeSource for PbsPro {
    fn name(&self) -> &'static str {
        "pbspro"
    }

    fn is_available(&self) -> bool {
        self.qstat.exists()
    }

    fn usage(&self) -> Result<HashMap<String, NativeUsage>, IngestError> {
        let command = format!("{} -x -f -F json", self.qstat.display());
        debug!(%command, "querying native accounting");

        let output = Command::new(&self.qstat)
            .args(["-x", "-f", "-F", "json"])
            .output()
            .map_err(|source| IngestError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(IngestError::CommandFailed {
                command,
                output: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }
        parse_qstat_json(&String::from_utf8_lossy(&output.stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_qstat() {
        let json = r#"{
            "pbs_version": "2022.1",
            "Jobs": {
                "4521.pbs": {
                    "job_state": "F",
                    "resources_used": {"walltime": "01:02:03", "mem": "2097152kb", "ncpus": 4}
                },
                "4522.pbs": {
                    "job_state": "F",
                    "resources_used": {"walltime": "00:00:10"}
                },
                "4523.pbs": {"job_state": "Q"},
                "4524.pbs": {
                    "resources_used": {"walltime": "bogus", "mem": "1kb"}
                }
            }
        }"#;
        let usage = parse_qstat_json(json).unwrap();
        assert_eq!(usage.len(), 1);
        let u = usage["4521.pbs"];
        assert!((u.memory - 2048.0).abs() < 1e-10);
        assert!((u.wall_time - 3723.0).abs() < 1e-10);
    }

    #[test]
    fn test_parse_qstat_no_jobs() {
        assert!(parse_qstat_json(r#"{"pbs_version": "2022.1"}"#)
            .unwrap()
            .is_empty());
        assert!(matches!(
            parse_qstat_json("not json"),
            Err(IngestError::Json(_))
        ));
    }

    #[test]
    fn test_unavailable_when_missing() {
        let pbs = PbsPro::new("/nonexistent/qstat");
        assert!(!pbs.is_available());
        assert_eq!(pbs.name(), "pbspro");
        assert!(pbs.usage().is_err());
    }
}
