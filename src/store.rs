//! JSON-file run store
//!
//! One document per run under the store directory:
//!
//! ```text
//! runs/
//!   run-1767225600.json    {"id": "...", "attrs": {...}, "results": [...]}
//!   run-1767229200.json
//! ```
//!
//! A run is append-only while the batch executes. Every `save()` rewrites
//! the document through a temp file and a rename, so a reader never sees a
//! half-written run and an interrupted batch keeps everything saved so far.

use crate::trial::TrialResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Opaque run metadata
pub type RunAttrs = BTreeMap<String, Value>;

/// Errors from the run store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("run not found: {0}")]
    UnknownRun(String),

    #[error("invalid run id: {0:?}")]
    InvalidRunId(String),

    #[error("invalid run document {path}: {source}")]
    InvalidDocument {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A stored run: ordered results plus attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    #[serde(default)]
    pub attrs: RunAttrs,
    #[serde(default)]
    pub results: Vec<TrialResult>,
}

/// Listing entry for a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub id: String,
    pub attrs: RunAttrs,
    pub result_count: usize,
    /// Mean Score over the stored results, if any
    pub mean_score: Option<f64>,
}

impl From<&Run> for RunSummary {
    fn from(run: &Run) -> Self {
        let mean_score = (!run.results.is_empty()).then(|| {
            run.results.iter().map(|r| r.score).sum::<f64>() / run.results.len() as f64
        });
        Self {
            id: run.id.clone(),
            attrs: run.attrs.clone(),
            result_count: run.results.len(),
            mean_score,
        }
    }
}

/// Store collaborator used by the CLI
pub trait RunStore {
    type Handle: RunHandle;

    /// Create and persist an empty run
    fn create_run(&self, attrs: RunAttrs) -> Result<Self::Handle, StoreError>;

    fn get_run(&self, id: &str) -> Result<Run, StoreError>;

    /// All runs, newest first
    fn list_runs(&self) -> Result<Vec<RunSummary>, StoreError>;
}

/// Write access to a run being recorded
pub trait RunHandle {
    fn id(&self) -> &str;

    fn add_result(&mut self, result: TrialResult);

    /// Persist everything added so far
    fn save(&mut self) -> Result<(), StoreError>;
}

/// Directory of JSON run documents
#[derive(Debug, Clone)]
pub struct JsonRunStore {
    dir: PathBuf,
}

impl JsonRunStore {
    /// Open a store, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    fn read_run(path: &Path) -> Result<Run, StoreError> {
        let content = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        serde_json::from_str(&content).map_err(|source| StoreError::InvalidDocument {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Next free id of the form `run-<unix secs>[-N]`
    fn fresh_id(&self) -> String {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let base = format!("run-{}", secs);
        if !self.path_for(&base).exists() {
            return base;
        }
        (1..)
            .map(|n| format!("{}-{}", base, n))
            .find(|candidate| !self.path_for(candidate).exists())
            .unwrap_or(base)
    }
}

impl RunStore for JsonRunStore {
    type Handle = JsonRunHandle;

    fn create_run(&self, attrs: RunAttrs) -> Result<JsonRunHandle, StoreError> {
        let id = self.fresh_id();
        let mut handle = JsonRunHandle {
            path: self.path_for(&id),
            run: Run {
                id,
                attrs,
                results: Vec::new(),
            },
        };
        handle.save()?;
        tracing::info!("created run {} at {}", handle.run.id, handle.path.display());
        Ok(handle)
    }

    fn get_run(&self, id: &str) -> Result<Run, StoreError> {
        // Ids name a file directly inside the store directory
        let plain = !id.is_empty()
            && id != "."
            && id != ".."
            && !id.contains(['/', '\\', '\0']);
        if !plain {
            return Err(StoreError::InvalidRunId(id.to_string()));
        }
        let path = self.path_for(id);
        if !path.is_file() {
            return Err(StoreError::UnknownRun(id.to_string()));
        }
        Self::read_run(&path)
    }

    fn list_runs(&self) -> Result<Vec<RunSummary>, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;

        let mut runs = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StoreError::io(&self.dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read_run(&path) {
                Ok(run) => runs.push(RunSummary::from(&run)),
                Err(e) => tracing::warn!("skipping unreadable run: {}", e),
            }
        }

        runs.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(runs)
    }
}

/// Handle to a run document being recorded
#[derive(Debug)]
pub struct JsonRunHandle {
    path: PathBuf,
    run: Run,
}

impl JsonRunHandle {
    pub fn run(&self) -> &Run {
        &self.run
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.run.attrs.insert(key.into(), value.into());
    }
}

impl RunHandle for JsonRunHandle {
    fn id(&self) -> &str {
        &self.run.id
    }

    fn add_result(&mut self, result: TrialResult) {
        self.run.results.push(result);
    }

    fn save(&mut self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.run).map_err(|source| {
            StoreError::InvalidDocument {
                path: self.path.clone(),
                source,
            }
        })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::io(&self.path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Literal;
    use tempfile::TempDir;

    fn attrs(command: &str) -> RunAttrs {
        let mut attrs = RunAttrs::new();
        attrs.insert("command".to_string(), Value::from(command));
        attrs
    }

    #[test]
    fn test_create_and_get_run() {
        let tmp = TempDir::new().unwrap();
        let store = JsonRunStore::open(tmp.path()).unwrap();

        let mut handle = store.create_run(attrs("./main")).unwrap();
        handle.add_result(TrialResult::new("100", 1.5, 0.2).with_metric("moves", Literal::Int(3)));
        handle.save().unwrap();
        handle.add_result(TrialResult::new("101", 2.5, 0.3));
        handle.save().unwrap();

        let run = store.get_run(handle.id()).unwrap();
        assert_eq!(run.attrs["command"], "./main");
        assert_eq!(run.results.len(), 2);
        assert_eq!(run.results[0].metrics["moves"], Literal::Int(3));
        assert_eq!(run.results[1].seed, "101");
    }

    #[test]
    fn test_created_run_is_persisted_empty() {
        let tmp = TempDir::new().unwrap();
        let store = JsonRunStore::open(tmp.path()).unwrap();
        let handle = store.create_run(RunAttrs::new()).unwrap();

        let run = store.get_run(handle.id()).unwrap();
        assert!(run.results.is_empty());
        assert!(!tmp.path().join(format!("{}.json.tmp", handle.id())).exists());
    }

    #[test]
    fn test_unknown_run() {
        let tmp = TempDir::new().unwrap();
        let store = JsonRunStore::open(tmp.path()).unwrap();
        assert!(matches!(
            store.get_run("run-0"),
            Err(StoreError::UnknownRun(ref id)) if id == "run-0"
        ));
    }

    #[test]
    fn test_rejects_ids_outside_store() {
        let tmp = TempDir::new().unwrap();
        let store = JsonRunStore::open(tmp.path().join("runs")).unwrap();
        let outside = Run {
            id: "x".to_string(),
            attrs: RunAttrs::new(),
            results: Vec::new(),
        };
        fs::write(tmp.path().join("x.json"), serde_json::to_string(&outside).unwrap()).unwrap();

        for id in ["../x", "..", "", "a/b", "a\\b"] {
            assert!(
                matches!(store.get_run(id), Err(StoreError::InvalidRunId(_))),
                "accepted id {:?}",
                id
            );
        }
    }

    #[test]
    fn test_ids_do_not_collide() {
        let tmp = TempDir::new().unwrap();
        let store = JsonRunStore::open(tmp.path()).unwrap();
        let a = store.create_run(RunAttrs::new()).unwrap();
        let b = store.create_run(RunAttrs::new()).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_list_runs_newest_first() {
        let tmp = TempDir::new().unwrap();
        let store = JsonRunStore::open(tmp.path()).unwrap();
        for (id, scores) in [("run-100", vec![1.0, 3.0]), ("run-200", vec![])] {
            let run = Run {
                id: id.to_string(),
                attrs: RunAttrs::new(),
                results: scores
                    .iter()
                    .enumerate()
                    .map(|(i, s)| TrialResult::new(i.to_string(), *s, 0.1))
                    .collect(),
            };
            fs::write(
                tmp.path().join(format!("{}.json", id)),
                serde_json::to_string(&run).unwrap(),
            )
            .unwrap();
        }
        fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();
        fs::write(tmp.path().join("broken.json"), "{").unwrap();

        let runs = store.list_runs().unwrap();
        let ids: Vec<&str> = runs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["run-200", "run-100"]);
        assert_eq!(runs[0].mean_score, None);
        assert_eq!(runs[1].mean_score, Some(2.0));
        assert_eq!(runs[1].result_count, 2);
    }

    #[test]
    fn test_invalid_document() {
        let tmp = TempDir::new().unwrap();
        let store = JsonRunStore::open(tmp.path()).unwrap();
        fs::write(tmp.path().join("run-1.json"), "not json").unwrap();
        assert!(matches!(
            store.get_run("run-1"),
            Err(StoreError::InvalidDocument { .. })
        ));
    }
}
