//! Per-project cache of observed task resources.
//!
//! Workflow engines forget old runs, so every task seen is stored in
//! `.optimized_cache.json` inside the project directory and re-read on the
//! next invocation. Entries are keyed by `native_id + hash`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{IngestError, NativeUsage};
use crate::models::{Measurement, Resources};

/// Cache file name inside each project directory.
pub const CACHE_FILE_NAME: &str = ".optimized_cache.json";

/// One cached task execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedTask {
    /// Job class (process name).
    pub category: String,
    /// Secondary tag; empty if none.
    #[serde(default)]
    pub subcategory: String,
    /// Peak memory (MB).
    pub memory: f64,
    /// Wall time (seconds).
    #[serde(rename = "wall-time")]
    pub wall_time: f64,
    /// Whether the task completed cleanly.
    pub success: bool,
    /// Whether the resources came from the batch scheduler's accounting.
    #[serde(default)]
    pub native: bool,
}

impl CachedTask {
    /// Converts into a measurement.
    pub fn to_measurement(&self) -> Measurement {
        Measurement::new(
            self.category.clone(),
            self.subcategory.clone(),
            Resources::new(self.memory, self.wall_time),
            self.success,
        )
    }
}

/// Task key → cached task, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceCache {
    tasks: BTreeMap<String, CachedTask>,
}

impl ResourceCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache file location for a project directory.
    pub fn path_for(project_dir: &Path) -> PathBuf {
        project_dir.join(CACHE_FILE_NAME)
    }

    /// Loads a cache file. A missing file yields an empty cache.
    pub fn load(path: &Path) -> Result<Self, IngestError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(IngestError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Writes the cache file.
    pub fn save(&self, path: &Path) -> Result<(), IngestError> {
        let content = serde_json::to_string(self)?;
        fs::write(path, content).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Deletes a cache file. Returns whether a file was removed.
    pub fn remove(path: &Path) -> Result<bool, IngestError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(IngestError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Number of cached tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Looks up a task by key.
    pub fn get(&self, key: &str) -> Option<&CachedTask> {
        self.tasks.get(key)
    }

    /// Iterates over `(key, task)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CachedTask)> {
        self.tasks.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Inserts a log-derived task.
    ///
    /// Native entries are never overwritten. Returns whether the task was
    /// stored.
    pub fn merge_trace(&mut self, key: impl Into<String>, task: CachedTask) -> bool {
        let key = key.into();
        if self.tasks.get(&key).is_some_and(|t| t.native) {
            return false;
        }
        self.tasks.insert(key, task);
        true
    }

    /// Overwrites a task's resources with scheduler accounting.
    ///
    /// Returns `false` if the key is not cached.
    pub fn apply_native(&mut self, key: &str, usage: &NativeUsage) -> bool {
        match self.tasks.get_mut(key) {
            Some(task) => {
                task.memory = usage.memory;
                task.wall_time = usage.wall_time;
                task.native = true;
                true
            }
            None => false,
        }
    }

    /// Drops non-native tasks whose wall time is at or below `min_seconds`.
    ///
    /// Very short tasks have unreliable peak memory sampling. Returns the
    /// number of tasks removed.
    pub fn prune_short(&mut self, min_seconds: f64) -> usize {
        let before = self.tasks.len();
        self.tasks
            .retain(|_, t| t.native || t.wall_time > min_seconds);
        before - self.tasks.len()
    }

    /// Measurements for every cached task, in key order.
    pub fn measurements(&self) -> impl Iterator<Item = Measurement> + '_ {
        self.tasks.values().map(CachedTask::to_measurement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(category: &str, memory: f64, wall_time: f64) -> CachedTask {
        CachedTask {
            category: category.into(),
            subcategory: String::new(),
            memory,
            wall_time,
            success: true,
            native: false,
        }
    }

    #[test]
    fn test_trace_never_overwrites_native() {
        let mut cache = ResourceCache::new();
        assert!(cache.merge_trace("1abc", task("align", 100.0, 60.0)));
        assert!(cache.apply_native("1abc", &NativeUsage::new(512.0, 90.0)));
        assert!(!cache.merge_trace("1abc", task("align", 1.0, 1.0)));

        let t = cache.get("1abc").unwrap();
        assert!(t.native);
        assert!((t.memory - 512.0).abs() < 1e-10);
        assert!((t.wall_time - 90.0).abs() < 1e-10);
    }

    #[test]
    fn test_trace_overwrites_trace() {
        let mut cache = ResourceCache::new();
        cache.merge_trace("k", task("align", 100.0, 60.0));
        cache.merge_trace("k", task("align", 200.0, 60.0));
        assert!((cache.get("k").unwrap().memory - 200.0).abs() < 1e-10);
    }

    #[test]
    fn test_apply_native_unknown_key() {
        let mut cache = ResourceCache::new();
        assert!(!cache.apply_native("missing", &NativeUsage::new(1.0, 1.0)));
    }

    #[test]
    fn test_prune_short_keeps_native() {
        let mut cache = ResourceCache::new();
        cache.merge_trace("short", task("a", 10.0, 5.0));
        cache.merge_trace("edge", task("a", 10.0, 10.0));
        cache.merge_trace("long", task("a", 10.0, 11.0));
        cache.merge_trace("native", task("a", 10.0, 1.0));
        cache.apply_native("native", &NativeUsage::new(10.0, 1.0));

        assert_eq!(cache.prune_short(10.0), 2);
        assert!(cache.get("long").is_some());
        assert!(cache.get("native").is_some());
        assert!(cache.get("edge").is_none());
    }

    #[test]
    fn test_round_trip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = ResourceCache::path_for(dir.path());

        assert!(ResourceCache::load(&path).unwrap().is_empty());

        let mut cache = ResourceCache::new();
        cache.merge_trace("k1", task("align", 100.0, 60.0));
        cache.save(&path).unwrap();

        let loaded = ResourceCache::load(&path).unwrap();
        assert_eq!(loaded, cache);

        assert!(ResourceCache::remove(&path).unwrap());
        assert!(!ResourceCache::remove(&path).unwrap());
    }

    #[test]
    fn test_reads_legacy_layout() {
        let json = r#"{"5a1b": {"category": "align", "subcategory": "s1", "memory": 120,
            "wall-time": 300, "success": true, "native": true},
            "6c2d": {"category": "sort", "memory": 10, "wall-time": 30, "success": false}}"#;
        let cache: ResourceCache = serde_json::from_str(json).unwrap();
        assert_eq!(cache.len(), 2);
        assert!(cache.get("5a1b").unwrap().native);
        assert!(!cache.get("6c2d").unwrap().native);

        let measurements: Vec<_> = cache.measurements().collect();
        assert_eq!(measurements[0].category(), "align");
        assert_eq!(measurements[0].subcategory(), "s1");
        assert!(!measurements[1].is_success());
    }
}
