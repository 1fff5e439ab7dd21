//! Append-only JSONL instrumentation log.

use crate::error::{GateError, GateResult};
use crate::signals::Snapshot;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable overriding the default log location.
pub const LOG_ENV_VAR: &str = "MINDGATE_LOG";

/// File name used under the home directory when no override is set.
pub const DEFAULT_LOG_FILE: &str = ".mindgate_instrumentation.jsonl";

/// Writer locks shared by every handle on the same file in this process.
static WRITERS: Mutex<BTreeMap<PathBuf, Arc<Mutex<()>>>> = parking_lot::const_mutex(BTreeMap::new());

fn writer_for(path: &Path) -> Arc<Mutex<()>> {
    let key = lock_key(path);
    let mut writers = WRITERS.lock();
    writers.retain(|_, lock| Arc::strong_count(lock) > 1);
    Arc::clone(writers.entry(key).or_default())
}

/// Canonical form of `path`, resolved through its parent when the file does
/// not exist yet.
fn lock_key(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    match (fs::canonicalize(parent), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

/// One observation of the entropy gate, as written to the log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub ts: DateTime<Utc>,
    pub entropy: f64,
    pub mean_entropy: f64,
    pub active_constraints: Vec<String>,
    pub identity_pressure: f64,
    pub dampening: f64,
}

impl LogRecord {
    pub fn from_snapshot(snapshot: &Snapshot, dampening: f64) -> Self {
        Self {
            ts: Utc::now(),
            entropy: snapshot.entropy,
            mean_entropy: snapshot.mean_entropy,
            active_constraints: snapshot
                .active_constraints
                .iter()
                .map(ToString::to_string)
                .collect(),
            identity_pressure: snapshot.identity_pressure,
            dampening,
        }
    }

    pub fn is_stabilized(&self) -> bool {
        self.active_constraints.iter().any(|c| c == "stabilize")
    }
}

/// Raw log contents: every line that parsed as JSON, plus a count of the
/// lines that did not.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadedLog {
    pub entries: Vec<Value>,
    pub skipped: usize,
}

/// Outcome of [`InstrumentationLog::repair`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairReport {
    pub kept: usize,
    pub dropped: usize,
}

/// Handle on a JSONL log file.
///
/// Every handle on the same file in this process shares one writer lock.
/// Appends and repairs hold it, and each record goes out in a single write,
/// so neither interleaved lines nor a repair can drop another handle's
/// record.
#[derive(Debug)]
pub struct InstrumentationLog {
    path: PathBuf,
    writer: Arc<Mutex<()>>,
}

impl InstrumentationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let writer = writer_for(&path);
        Self { path, writer }
    }

    /// Log at [`default_path`].
    pub fn open_default() -> Self {
        Self::new(default_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a gate observation.
    pub fn append(&self, snapshot: &Snapshot, dampening: f64) -> GateResult<LogRecord> {
        let record = LogRecord::from_snapshot(snapshot, dampening);
        self.append_record(&record)?;
        Ok(record)
    }

    pub fn append_record(&self, record: &LogRecord) -> GateResult<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let _guard = self.writer.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| GateError::log(&self.path, e))?;
        file.write_all(&line)
            .map_err(|e| GateError::log(&self.path, e))
    }

    /// Every parseable line. A missing file is an empty log.
    pub fn load(&self) -> GateResult<LoadedLog> {
        let Some(contents) = self.read_contents()? else {
            return Ok(LoadedLog::default());
        };

        let mut loaded = LoadedLog::default();
        for line in contents.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<Value>(line) {
                Ok(entry) => loaded.entries.push(entry),
                Err(_) => loaded.skipped += 1,
            }
        }
        if loaded.skipped > 0 {
            tracing::warn!(
                path = %self.path.display(),
                skipped = loaded.skipped,
                "Skipped unparseable log lines"
            );
        }
        Ok(loaded)
    }

    /// Entries that fit the [`LogRecord`] shape, oldest first.
    pub fn records(&self) -> GateResult<Vec<LogRecord>> {
        let loaded = self.load()?;
        Ok(loaded
            .entries
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect())
    }

    /// Rewrite the log keeping only parseable lines.
    ///
    /// The cleaned contents are written to a sibling file and renamed over
    /// the original. Blank lines are discarded without being counted.
    pub fn repair(&self) -> GateResult<RepairReport> {
        let _guard = self.writer.lock();
        let Some(contents) = self.read_contents()? else {
            return Ok(RepairReport::default());
        };

        let mut report = RepairReport::default();
        let mut cleaned = String::with_capacity(contents.len());
        for line in contents.lines().filter(|l| !l.trim().is_empty()) {
            if serde_json::from_str::<Value>(line).is_ok() {
                cleaned.push_str(line);
                cleaned.push('\n');
                report.kept += 1;
            } else {
                report.dropped += 1;
            }
        }

        let staging = self.staging_path();
        fs::write(&staging, cleaned).map_err(|e| GateError::log(&staging, e))?;
        fs::rename(&staging, &self.path).map_err(|e| GateError::log(&self.path, e))?;

        tracing::info!(
            path = %self.path.display(),
            kept = report.kept,
            dropped = report.dropped,
            "Instrumentation log repaired"
        );
        Ok(report)
    }

    fn read_contents(&self) -> GateResult<Option<String>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(GateError::log(&self.path, e)),
        }
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".repair");
        self.path.with_file_name(name)
    }
}

/// `$MINDGATE_LOG` when set, otherwise the default file under `$HOME`.
pub fn default_path() -> PathBuf {
    path_from(|var| std::env::var_os(var))
}

fn path_from<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<OsString>,
{
    if let Some(path) = lookup(LOG_ENV_VAR).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    lookup("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(DEFAULT_LOG_FILE)
}
