//! Mutation operations on the record log.
//!
//! The single entry point for mutating a log file is [`mutate`]: it takes
//! the lock, applies one add/update/delete, re-sorts, and atomically
//! rewrites the file. Either the whole sequence completes before the lock
//! is released, or no persisted change is visible.

use super::{Entry, SeqDataLog};
use crate::config::Config;
use crate::error::{Result, SeqLogError};
use crate::locks;
use crate::target;
use std::path::Path;

/// The three mutation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Record a new directory; fails if it is already logged.
    Add,
    /// Refresh a directory's timestamp and description (upsert).
    Update,
    /// Remove a directory's entry; no error if absent.
    Delete,
}

impl Mode {
    /// Action name recorded in lock metadata and audit events.
    pub fn action(&self) -> &'static str {
        match self {
            Mode::Add => "add",
            Mode::Update => "update",
            Mode::Delete => "delete",
        }
    }
}

impl SeqDataLog {
    /// Append a new entry, enforcing key uniqueness.
    pub fn add(&mut self, entry: Entry) -> Result<()> {
        if self.find(&entry.path).is_some() {
            return Err(SeqLogError::DuplicateEntry(entry.path));
        }
        self.entries_mut().push(entry);
        Ok(())
    }

    /// Replace any existing entry for the same path, or insert.
    pub fn upsert(&mut self, entry: Entry) {
        self.remove(&entry.path);
        self.entries_mut().push(entry);
    }

    /// Remove the entry for `path`. Returns whether one was removed.
    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.len();
        self.entries_mut().retain(|e| e.path != path);
        self.len() < before
    }

    /// Sort entries by timestamp descending.
    ///
    /// The sort is stable, so entries with equal timestamps keep their
    /// previous relative order.
    pub fn sort_by_timestamp(&mut self) {
        self.entries_mut()
            .sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    }
}

/// Perform one mutation against a log file.
///
/// `directory` must already be absolute and canonicalized (the caller's
/// responsibility, see [`crate::target`]). The lock is held for the whole
/// scan + mutate + sort + rewrite sequence and released on every exit
/// path. Timestamps come from the directory's modification time.
pub fn mutate(
    log_path: &Path,
    mode: Mode,
    directory: &Path,
    description: &str,
    config: &Config,
) -> Result<()> {
    mutate_with_timestamp_source(
        log_path,
        mode,
        directory,
        description,
        config,
        target::dir_timestamp,
    )
}

/// [`mutate`] with an explicit timestamp collaborator.
///
/// The timestamp source is only consulted for add/update, after the
/// target existence check. Split out so tests can pin deterministic
/// timestamps.
pub fn mutate_with_timestamp_source(
    log_path: &Path,
    mode: Mode,
    directory: &Path,
    description: &str,
    config: &Config,
    timestamp_source: impl Fn(&Path) -> Result<i64>,
) -> Result<()> {
    if !directory.is_absolute() {
        return Err(SeqLogError::UserError(format!(
            "target directory must be an absolute path: {}",
            directory.display()
        )));
    }

    let _guard = locks::acquire_log_lock(log_path, mode.action(), config)?;

    let key = directory.to_string_lossy().into_owned();
    let mut log = SeqDataLog::load_or_default(log_path)?;

    match mode {
        Mode::Add => {
            ensure_target_dir(directory)?;
            let timestamp = timestamp_source(directory)?;
            log.add(Entry::new(&key, timestamp, description))?;
        }
        Mode::Update => {
            ensure_target_dir(directory)?;
            let timestamp = timestamp_source(directory)?;
            log.upsert(Entry::new(&key, timestamp, description));
        }
        // A delete may target a directory that has since vanished, so no
        // existence check and no timestamp.
        Mode::Delete => {
            log.remove(&key);
        }
    }

    log.sort_by_timestamp();
    log.save(log_path)
}

/// Add/update precondition: the target must exist and be a directory.
fn ensure_target_dir(directory: &Path) -> Result<()> {
    if !directory.is_dir() {
        return Err(SeqLogError::TargetNotFound(
            directory.display().to_string(),
        ));
    }
    Ok(())
}
