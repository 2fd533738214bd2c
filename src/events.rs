//! Audit event logging for seqlog.
//!
//! Successful mutations and manual lock clears are recorded as NDJSON
//! (one JSON object per line) in a side-car file next to the log:
//! `<log file name>.events.ndjson`.
//!
//! Each event carries:
//! - `ts`: RFC3339 timestamp
//! - `action`: add/update/delete/lock_clear
//! - `actor`: `user@HOST`
//! - `path`: the target directory, when the action has one
//! - `details`: freeform action-specific object
//!
//! Event writing is best-effort: callers warn and continue when an append
//! fails, so auditing can never block a mutation that already succeeded.

use crate::error::{Result, SeqLogError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Actions recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// Directory added to the log.
    Add,
    /// Directory entry refreshed.
    Update,
    /// Directory entry removed.
    Delete,
    /// Lock cleared manually.
    LockClear,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::Add => write!(f, "add"),
            EventAction::Update => write!(f, "update"),
            EventAction::Delete => write!(f, "delete"),
            EventAction::LockClear => write!(f, "lock_clear"),
        }
    }
}

/// One audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// RFC3339 timestamp when the event occurred.
    pub ts: DateTime<Utc>,

    /// The action that was performed.
    pub action: EventAction,

    /// Who performed the action (e.g., `user@HOST`).
    pub actor: String,

    /// Target directory path, for actions that have one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Freeform action-specific details.
    pub details: Value,
}

impl Event {
    /// Create a new event with the current timestamp and ambient actor.
    pub fn new(action: EventAction) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: actor_string(),
            path: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Set the target directory path for this event.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the details object for this event.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            SeqLogError::UserError(format!("failed to serialize event to JSON: {}", e))
        })
    }
}

/// Actor string for event records.
fn actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Path of the audit side-car for a log file.
pub fn events_path_for(log_path: &Path) -> Result<PathBuf> {
    let filename = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            SeqLogError::UserError(format!("invalid log file path: {}", log_path.display()))
        })?;
    let parent = log_path.parent().unwrap_or(Path::new("."));
    Ok(parent.join(format!("{}.events.ndjson", filename)))
}

/// Append an event to the audit log for `log_path`.
///
/// One JSON line per event, file created on first append.
pub fn append_event(log_path: &Path, event: &Event) -> Result<()> {
    let events_file = events_path_for(log_path)?;
    let json_line = event.to_ndjson_line()?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&events_file)
        .map_err(|e| {
            SeqLogError::IoFailure(format!(
                "failed to open events file '{}': {}",
                events_file.display(),
                e
            ))
        })?;

    writeln!(file, "{}", json_line).map_err(|e| {
        SeqLogError::IoFailure(format!(
            "failed to write event to '{}': {}",
            events_file.display(),
            e
        ))
    })?;

    Ok(())
}
