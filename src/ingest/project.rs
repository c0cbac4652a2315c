//! Per-project collection.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info, warn};

use super::{parse_trace, IngestError, NativeSource, NativeUsage, NextflowLog, ResourceCache};
use crate::models::Measurement;

/// Default threshold (seconds) under which log-derived tasks are dropped.
pub const DEFAULT_SKIP_DURATION_SECS: f64 = 10.0;

/// Counts from one project collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectSummary {
    /// Runs listed by the workflow engine.
    pub runs: usize,
    /// Trace records merged into the cache.
    pub traced: usize,
    /// Entries updated from scheduler accounting.
    pub native: usize,
    /// Entries pruned as too short.
    pub pruned: usize,
    /// Entries remaining in the cache.
    pub total: usize,
}

/// Queries every available native source and merges their usage.
///
/// Unavailable sources are skipped; failing sources are logged and skipped.
pub fn collect_native_usage(sources: &[Box<dyn NativeSource>]) -> HashMap<String, NativeUsage> {
    let mut merged = HashMap::new();
    for source in sources {
        if !source.is_available() {
            debug!(source = source.name(), "native source unavailable");
            continue;
        }
        match source.usage() {
            Ok(usage) => {
                debug!(source = source.name(), jobs = usage.len(), "native usage");
                merged.extend(usage);
            }
            Err(e) => warn!(source = source.name(), error = %e, "native source failed"),
        }
    }
    merged
}

/// Deletes the cache of a project directory. Returns whether one existed.
pub fn clean_project(project_dir: &Path) -> Result<bool, IngestError> {
    ResourceCache::remove(&ResourceCache::path_for(project_dir))
}

/// Gathers measurements for project directories.
///
/// For each directory the cache is loaded, new trace records from
/// `nextflow log` are merged in, scheduler accounting overrides matching
/// entries, short tasks are pruned and the cache is written back.
#[derive(Debug, Clone)]
pub struct ProjectCollector {
    nextflow: NextflowLog,
    skip_duration_secs: f64,
}

impl Default for ProjectCollector {
    fn default() -> Self {
        Self::new(NextflowLog::new())
    }
}

impl ProjectCollector {
    /// Creates a collector with the default skip duration.
    pub fn new(nextflow: NextflowLog) -> Self {
        Self {
            nextflow,
            skip_duration_secs: DEFAULT_SKIP_DURATION_SECS,
        }
    }

    /// Sets the skip duration (seconds).
    pub fn with_skip_duration(mut self, seconds: f64) -> Self {
        self.skip_duration_secs = seconds;
        self
    }

    /// Skip duration (seconds).
    pub fn skip_duration(&self) -> f64 {
        self.skip_duration_secs
    }

    /// Collects measurements from one project directory.
    ///
    /// A failing `nextflow log` is logged and the cached data is used
    /// alone. Cache I/O failures are returned.
    pub fn collect(
        &self,
        project_dir: &Path,
        native: &HashMap<String, NativeUsage>,
    ) -> Result<(Vec<Measurement>, ProjectSummary), IngestError> {
        let cache_path = ResourceCache::path_for(project_dir);
        let mut cache = ResourceCache::load(&cache_path)?;
        let mut summary = ProjectSummary::default();
        let mut native_keys: HashMap<String, String> = HashMap::new();

        match self.trace_records(project_dir) {
            Ok((runs, records)) => {
                summary.runs = runs;
                for record in records {
                    if !record.native_id.is_empty() {
                        native_keys.insert(record.native_id.clone(), record.key.clone());
                    }
                    if cache.merge_trace(record.key, record.task) {
                        summary.traced += 1;
                    }
                }
            }
            Err(e) => warn!(
                dir = %project_dir.display(),
                error = %e,
                "could not read workflow log; using cached tasks only"
            ),
        }

        for (native_id, key) in &native_keys {
            if let Some(usage) = native.get(native_id) {
                if cache.apply_native(key, usage) {
                    summary.native += 1;
                }
            }
        }

        summary.pruned = cache.prune_short(self.skip_duration_secs);
        summary.total = cache.len();
        cache.save(&cache_path)?;

        info!(
            dir = %project_dir.display(),
            runs = summary.runs,
            traced = summary.traced,
            native = summary.native,
            pruned = summary.pruned,
            total = summary.total,
            "collected project"
        );
        Ok((cache.measurements().collect(), summary))
    }

    fn trace_records(
        &self,
        project_dir: &Path,
    ) -> Result<(usize, Vec<super::TraceRecord>), IngestError> {
        let runs = self.nextflow.run_names(project_dir)?;
        if runs.is_empty() {
            return Ok((0, Vec::new()));
        }
        let output = self.nextflow.trace(project_dir, &runs)?;
        let (records, errors) = parse_trace(&output);
        for e in &errors {
            warn!(dir = %project_dir.display(), error = %e, "skipping trace line");
        }
        Ok((runs.len(), records))
    }
}
