//! Record log model for seqlog.
//!
//! The log is a flat tab-delimited text file. Line 1 is a literal header
//! comment; every other line is one entry:
//!
//! ```text
//! # Log of sequencing data directories
//! /mnt/data/130805_RUN_0012	1375696800	HiSeq paired-end run
//! /mnt/data/130619_RUN_0011	1371639600
//! ```
//!
//! Entries are keyed by their absolute directory path; no two entries may
//! share a path. After every successful mutation the file is rewritten
//! with entries sorted by timestamp descending (ties keep their previous
//! relative order), so the most recently touched directory is always
//! first.
//!
//! Raw text is parsed once into [`Entry`] values; all mutation decisions
//! are made against the structured data, never by re-scanning the text.

use crate::error::{Result, SeqLogError};

mod io;
mod mutations;

pub use mutations::{Mode, mutate, mutate_with_timestamp_source};

/// Literal header written as the first line of every log file.
pub const LOG_HEADER: &str = "# Log of sequencing data directories";

/// One record in the log: directory path, UNIX timestamp, description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Absolute directory path; unique across the log.
    pub path: String,

    /// UNIX timestamp recorded for the directory at add/update time.
    pub timestamp: i64,

    /// Free-text description; empty when none was given.
    pub description: String,
}

impl Entry {
    /// Create an entry, flattening the description to a single line.
    ///
    /// Tabs and newlines in the description would corrupt the flat
    /// format, so they become spaces here.
    pub fn new(path: &str, timestamp: i64, description: &str) -> Self {
        Self {
            path: path.to_string(),
            timestamp,
            description: description.replace(['\t', '\n', '\r'], " "),
        }
    }

    /// Parse one log line. `lineno` is 1-based, for error messages.
    fn parse_line(line: &str, lineno: usize) -> Result<Self> {
        let mut fields = line.splitn(3, '\t');

        let path = fields.next().unwrap_or("");
        if path.is_empty() {
            return Err(SeqLogError::UserError(format!(
                "malformed log entry at line {}: empty directory path",
                lineno
            )));
        }

        let timestamp_field = fields.next().ok_or_else(|| {
            SeqLogError::UserError(format!(
                "malformed log entry at line {}: missing timestamp field",
                lineno
            ))
        })?;
        let timestamp: i64 = timestamp_field.trim().parse().map_err(|_| {
            SeqLogError::UserError(format!(
                "malformed log entry at line {}: invalid timestamp '{}'",
                lineno, timestamp_field
            ))
        })?;

        // Older logs may omit the trailing tab for an empty description.
        let description = fields.next().unwrap_or("").to_string();

        Ok(Self {
            path: path.to_string(),
            timestamp,
            description,
        })
    }

    /// Serialize to one tab-delimited log line (no trailing newline).
    fn to_line(&self) -> String {
        format!("{}\t{}\t{}", self.path, self.timestamp, self.description)
    }
}

/// The full entry set of one log file.
#[derive(Debug, Clone, Default)]
pub struct SeqDataLog {
    entries: Vec<Entry>,
}

impl SeqDataLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a log from its file content.
    ///
    /// Comment lines (leading `#`, including the header) and blank lines
    /// are skipped; anything else must be a well-formed entry.
    pub fn parse(content: &str) -> Result<Self> {
        let mut entries = Vec::new();

        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            entries.push(Entry::parse_line(line, idx + 1)?);
        }

        Ok(Self { entries })
    }

    /// Look up an entry by exact path match.
    pub fn find(&self, path: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// All entries, in on-disk order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries_mut(&mut self) -> &mut Vec<Entry> {
        &mut self.entries
    }
}

impl std::fmt::Display for SeqDataLog {
    /// Render the full file content: header line, then one line per entry.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", LOG_HEADER)?;
        for entry in &self.entries {
            writeln!(f, "{}", entry.to_line())?;
        }
        Ok(())
    }
}
