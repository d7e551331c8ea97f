//! # Activity Logging
//!
//! Append-only, timestamped text logs for agent activity (thinking, writing, error recovery).
//! Every entry is also dispatched to `tracing`; file failures never interrupt the caller.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{Level, debug, error, info, warn};

/// One activity log file
#[derive(Debug, Clone)]
pub struct ActivityLog {
    path: PathBuf,
    level: Level,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            level: Level::INFO,
        }
    }

    /// Level used when mirroring entries to `tracing`
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `[YYYY-mm-dd HH:MM:SS] entry`.
    pub fn log(&self, entry: &str) {
        match self.level {
            Level::ERROR => error!(target: "activity", "{}", entry),
            Level::WARN => warn!(target: "activity", "{}", entry),
            Level::INFO => info!(target: "activity", "{}", entry),
            _ => debug!(target: "activity", "{}", entry),
        }

        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let line = format!("[{}] {}\n", timestamp, entry);
        if let Err(e) = self.append(&line) {
            warn!("Failed to write {}: {}", self.path.display(), e);
        }
    }

    /// Staged entry (`STAGE: details`), the format used by the writer and error handler.
    pub fn stage(&self, stage: &str, details: &str) {
        self.log(&format!("{}: {}", stage, details));
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }

    /// Whole log content; empty when the file does not exist yet.
    pub fn read(&self) -> std::io::Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e),
        }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Truncates the log.
    pub fn clear(&self) -> std::io::Result<()> {
        fs::write(&self.path, "")
    }
}
