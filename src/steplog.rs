//! Structured step log
//!
//! Every pipeline stage records what it did as a flat JSON object with
//! `action`, `status` and action-specific extras. The file-backed log
//! appends one object per line to `<dir>/run_YYYYMMDD.jsonl`.
//!
//! Several runs may append to the same day file at once, so each entry is
//! written with one `write_all` on a freshly opened append-mode handle.

use chrono::Local;
use serde_json::{Map, Value};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// One step record
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub action: String,
    pub status: String,
    pub extras: Map<String, Value>,
}

impl Step {
    pub fn new(action: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            status: status.into(),
            extras: Map::new(),
        }
    }

    /// Attach an extra field
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extras.insert(key.to_string(), value.into());
        self
    }

    /// Flatten into the on-disk shape (timestamp first)
    pub fn to_entry(&self) -> Value {
        let mut entry = Map::new();
        entry.insert("timestamp".into(), Value::String(Local::now().to_rfc3339()));
        entry.insert("action".into(), Value::String(self.action.clone()));
        entry.insert("status".into(), Value::String(self.status.clone()));
        for (k, v) in &self.extras {
            if k != "timestamp" && k != "action" && k != "status" {
                entry.insert(k.clone(), v.clone());
            }
        }
        Value::Object(entry)
    }
}

/// Sink for step records
pub trait StepRecorder: Send + Sync {
    fn record(&self, step: Step);
}

/// Append-only JSONL log keyed by local date
pub struct JsonlStepLog {
    dir: PathBuf,
}

impl JsonlStepLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Today's log file
    pub fn current_path(&self) -> PathBuf {
        self.dir
            .join(format!("run_{}.jsonl", Local::now().format("%Y%m%d")))
    }

    fn append(&self, entry: &Value) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.current_path())?;
        file.write_all(line.as_bytes())
    }
}

impl StepRecorder for JsonlStepLog {
    fn record(&self, step: Step) {
        let entry = step.to_entry();
        debug!(target: "a11yscan::steps", "{}", entry);
        if let Err(e) = self.append(&entry) {
            warn!("Failed to append step log in {}: {}", self.dir.display(), e);
        }
    }
}

/// In-memory log (tests, `--no-log`)
#[derive(Default)]
pub struct MemoryStepLog {
    steps: Mutex<Vec<Step>>,
}

impl MemoryStepLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> Vec<Step> {
        self.steps.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Steps for one action, in order
    pub fn for_action(&self, action: &str) -> Vec<Step> {
        self.steps()
            .into_iter()
            .filter(|s| s.action == action)
            .collect()
    }

    /// Count of steps matching action and status
    pub fn count(&self, action: &str, status: &str) -> usize {
        self.steps()
            .iter()
            .filter(|s| s.action == action && s.status == status)
            .count()
    }
}

impl StepRecorder for MemoryStepLog {
    fn record(&self, step: Step) {
        debug!(target: "a11yscan::steps", "{} {}", step.action, step.status);
        if let Ok(mut steps) = self.steps.lock() {
            steps.push(step);
        }
    }
}
