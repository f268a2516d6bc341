//! Local compile-history sinks.
//!
//! Two sinks, both best-effort:
//! - `.facto-history.jsonl` — append-only log, one record per compile attempt
//! - `.facto-last-compile.json` — snapshot of the latest attempt, overwritten
//!
//! A sink write failure is logged and never fails the compile.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const HISTORY_LOG: &str = ".facto-history.jsonl";
pub const LAST_COMPILE_SNAPSHOT: &str = ".facto-last-compile.json";

/// One compile attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub timestamp: DateTime<Utc>,
    /// Fingerprint of (source, options) — matches the session cache key.
    pub fingerprint: String,
    /// Base URL of the backend that served the attempt.
    pub backend: String,
    pub success: bool,
    pub duration_ms: u64,
    pub from_cache: bool,
    /// Whether the sync endpoint was used instead of streaming.
    pub sync: bool,
}

pub struct HistorySink {
    log_path: PathBuf,
    snapshot_path: PathBuf,
}

impl HistorySink {
    pub fn new(dir: &Path) -> Self {
        Self {
            log_path: dir.join(HISTORY_LOG),
            snapshot_path: dir.join(LAST_COMPILE_SNAPSHOT),
        }
    }

    pub fn in_current_dir() -> Self {
        Self::new(Path::new("."))
    }

    /// Append to the log and overwrite the snapshot.
    pub fn record(&self, record: &HistoryRecord) {
        match serde_json::to_string(record) {
            Ok(line) => {
                let appended = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.log_path)
                    .and_then(|mut file| writeln!(file, "{line}"));
                if let Err(err) = appended {
                    warn!(path = %self.log_path.display(), "failed to append history record: {err}");
                }
            }
            Err(err) => warn!("failed to serialize history record: {err}"),
        }

        match serde_json::to_string_pretty(record) {
            Ok(snapshot) => {
                if let Err(err) = std::fs::write(&self.snapshot_path, snapshot) {
                    warn!(path = %self.snapshot_path.display(), "failed to write compile snapshot: {err}");
                }
            }
            Err(err) => warn!("failed to serialize compile snapshot: {err}"),
        }
    }
}
