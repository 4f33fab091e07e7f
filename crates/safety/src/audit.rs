//! Append-only audit log — one JSON record per line.
//!
//! The log is write-only: nothing in this crate reads or truncates it.
//! Appends go through a mutex so each record lands as a whole line even
//! when multiple threads log concurrently.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use steward_core::SafetyError;

/// A single audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Float seconds since the Unix epoch
    pub ts: f64,

    /// Event kind: "privilege_change", "paused", "resumed", "tool"
    pub event: String,

    pub detail: BTreeMap<String, String>,

    /// Privilege level at time of logging
    pub privilege: String,

    /// Paused flag at time of logging
    pub paused: bool,
}

/// JSON-lines audit sink.
pub struct AuditLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog").field("path", &self.path).finish()
    }
}

impl AuditLog {
    /// Open (or create) the log file for appending, creating parent
    /// directories as needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SafetyError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| SafetyError::AuditWrite(format!("{}: {e}", parent.display())))?;
            }
        }
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|e| SafetyError::AuditWrite(format!("{}: {e}", path.display())))?;
        Ok(Self { path, file: Mutex::new(file) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single line.
    pub fn append(&self, record: &AuditRecord) -> Result<(), SafetyError> {
        let line = serde_json::to_string(record)
            .map_err(|e| SafetyError::AuditWrite(e.to_string()))?;
        let mut file = self.file.lock().expect("audit lock poisoned");
        writeln!(file, "{line}").map_err(|e| SafetyError::AuditWrite(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(event: &str) -> AuditRecord {
        AuditRecord {
            ts: 1700000000.25,
            event: event.into(),
            detail: BTreeMap::from([("tool".into(), "issue_command".into())]),
            privilege: "informational".into(),
            paused: false,
        }
    }

    #[test]
    fn append_writes_one_json_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::open(dir.path().join("safety.log")).unwrap();

        log.append(&record("tool")).unwrap();
        log.append(&record("paused")).unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: AuditRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.event, "tool");
        assert_eq!(parsed.detail.get("tool").map(String::as_str), Some("issue_command"));
        assert!(!parsed.paused);
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("var").join("deep").join("safety.log");
        let log = AuditLog::open(&nested).unwrap();
        log.append(&record("resumed")).unwrap();
        assert!(nested.exists());
    }

    #[test]
    fn reopen_appends_rather_than_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("safety.log");
        AuditLog::open(&path).unwrap().append(&record("paused")).unwrap();
        AuditLog::open(&path).unwrap().append(&record("resumed")).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
