//! Record log: JSONL append-only persistence for analyses and alerts.
//!
//! Two files under the state directory, one JSON object per line:
//! `analyses.jsonl` and `alerts.jsonl`. Replaying the log into a
//! `MemoryStore` rebuilds the store: later analyses replace earlier ones with
//! the same key, and duplicate alerts collapse to the first.

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use coilwatch_core::domain::{AlertRecord, AnalysisRecord};
use coilwatch_core::store::{MemoryStore, RecordStore};

use crate::batch::WrittenRecords;

pub const ANALYSES_FILE: &str = "analyses.jsonl";
pub const ALERTS_FILE: &str = "alerts.jsonl";

#[derive(Debug, Error)]
pub enum LogError {
    #[error("record log I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> LogError + '_ {
    move |source| LogError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// JSONL record log rooted at a state directory.
#[derive(Debug, Clone)]
pub struct RecordLog {
    dir: PathBuf,
}

impl RecordLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn append_analyses(&self, records: &[AnalysisRecord]) -> Result<usize, LogError> {
        append_lines(&self.dir.join(ANALYSES_FILE), records)
    }

    pub fn append_alerts(&self, alerts: &[AlertRecord]) -> Result<usize, LogError> {
        append_lines(&self.dir.join(ALERTS_FILE), alerts)
    }

    /// Append everything a run wrote.
    pub fn append_written(&self, written: &WrittenRecords) -> Result<(), LogError> {
        self.append_analyses(&written.analyses)?;
        self.append_alerts(&written.alerts)?;
        Ok(())
    }

    /// Replay both files into a fresh store.
    pub fn load_store(&self) -> Result<MemoryStore, LogError> {
        let store = MemoryStore::new();
        for record in read_lines::<AnalysisRecord>(&self.dir.join(ANALYSES_FILE))? {
            store.upsert_analysis(record);
        }
        for alert in read_lines::<AlertRecord>(&self.dir.join(ALERTS_FILE))? {
            store.insert_alert(alert);
        }
        debug!(
            dir = %self.dir.display(),
            analyses = store.analysis_count(),
            alerts = store.alert_count(),
            "record log replayed"
        );
        Ok(store)
    }
}

fn append_lines<T: Serialize>(path: &Path, items: &[T]) -> Result<usize, LogError> {
    if items.is_empty() {
        return Ok(0);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }
    let mut buf = String::new();
    for item in items {
        buf.push_str(&serde_json::to_string(item)?);
        buf.push('\n');
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err(path))?;
    file.write_all(buf.as_bytes()).map_err(io_err(path))?;
    file.flush().map_err(io_err(path))?;
    Ok(items.len())
}

/// Read every well-formed line; malformed lines are logged and skipped.
fn read_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, LogError> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_err(path)(e)),
    };
    let mut items = Vec::new();
    for (lineno, line) in io::BufReader::new(file).lines().enumerate() {
        let line = line.map_err(io_err(path))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(&line) {
            Ok(item) => items.push(item),
            Err(e) => warn!(path = %path.display(), line = lineno + 1, error = %e, "skipping malformed record"),
        }
    }
    Ok(items)
}
