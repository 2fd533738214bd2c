//! Locking subsystem for seqlog.
//!
//! Every mutating operation on a log file must hold the log's lock: a
//! side-car file named `<log file name>.lock` in the same directory,
//! created with **create_new** semantics (exclusive create) so that only
//! one process can acquire it at a time across cooperating hosts.
//!
//! # Lock Metadata
//!
//! Each lock file contains JSON metadata:
//! - `owner`: who holds the lock (e.g., `user@HOST`)
//! - `pid`: the process ID (optional)
//! - `created_at`: RFC3339 timestamp
//! - `action`: the operation being performed (add/update/delete)
//!
//! # Stale Locks
//!
//! A process that dies without releasing leaves its lock file behind. A
//! lock whose metadata is unreadable, or whose age exceeds the configured
//! `lock_stale_minutes`, is treated as abandoned: acquisition removes it
//! and retries once. A live lock is retried up to `lock_retries` times
//! with `lock_wait_ms` sleeps before failing, so acquisition never hangs.
//!
//! # RAII Guards
//!
//! Locks are released through guard objects that delete the lock file when
//! dropped, on every exit path. If deletion fails during drop, a warning
//! is printed but the process does not panic.

use crate::config::Config;
use crate::error::{Result, SeqLogError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Lock metadata stored in lock files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockMetadata {
    /// Owner of the lock (e.g., `user@HOST`).
    pub owner: String,

    /// Process ID of the lock holder (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,

    /// Timestamp when the lock was created (RFC3339).
    pub created_at: DateTime<Utc>,

    /// The operation being performed (add/update/delete).
    pub action: String,
}

impl LockMetadata {
    /// Create new lock metadata with the current timestamp.
    pub fn new(action: &str) -> Self {
        Self {
            owner: owner_string(),
            pid: Some(std::process::id()),
            created_at: Utc::now(),
            action: action.to_string(),
        }
    }

    /// Parse lock metadata from a lock file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            SeqLogError::UserError(format!(
                "failed to read lock file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            SeqLogError::UserError(format!(
                "failed to parse lock file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    /// Serialize lock metadata to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            SeqLogError::UserError(format!("failed to serialize lock metadata: {}", e))
        })
    }

    /// Age of the lock.
    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.created_at)
    }

    /// Format the age as a human-readable string.
    pub fn age_string(&self) -> String {
        let age = self.age();
        let minutes = age.num_minutes();
        let hours = age.num_hours();
        let days = age.num_days();

        if days > 0 {
            format!("{}d {}h", days, hours % 24)
        } else if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else {
            format!("{}m", minutes)
        }
    }

    /// Whether the lock is stale for the given threshold in minutes.
    pub fn is_stale(&self, stale_minutes: u32) -> bool {
        self.age().num_minutes() > stale_minutes as i64
    }
}

/// Get the owner string for lock metadata.
fn owner_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Path of the lock file guarding a log file: `<log file name>.lock` in
/// the same directory.
pub fn lock_path_for(log_path: &Path) -> Result<PathBuf> {
    let filename = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            SeqLogError::UserError(format!("invalid log file path: {}", log_path.display()))
        })?;
    let parent = log_path.parent().unwrap_or(Path::new("."));
    Ok(parent.join(format!("{}.lock", filename)))
}

/// Information about an active lock, for operator inspection.
#[derive(Debug, Clone)]
pub struct LockInfo {
    /// The lock file path.
    pub path: PathBuf,

    /// The lock metadata, if it could be read.
    pub metadata: Option<LockMetadata>,

    /// Whether the lock is stale (unreadable metadata counts as stale).
    pub is_stale: bool,
}

/// RAII guard for a log lock.
///
/// When dropped, the lock file is deleted. If deletion fails, a warning is
/// printed but no panic occurs.
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
    released: bool,
}

impl LockGuard {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            released: false,
        }
    }

    /// Path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock explicitly, surfacing any deletion error.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            // Already gone (e.g. cleared manually): release is idempotent.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SeqLogError::IoFailure(format!(
                "failed to release lock '{}': {}",
                self.path.display(),
                e
            ))),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = fs::remove_file(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            eprintln!(
                "Warning: failed to release lock '{}': {}",
                self.path.display(),
                e
            );
        }
    }
}

/// Why a single acquisition attempt did not produce a guard.
enum AcquireFailure {
    /// The lock file already exists; holder metadata if readable.
    Held(Option<LockMetadata>),
    /// A real filesystem error, not contention.
    Io(SeqLogError),
}

/// One exclusive-create attempt on the lock file.
fn try_create(lock_path: &Path, metadata: &LockMetadata) -> std::result::Result<LockGuard, AcquireFailure> {
    let mut file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(lock_path)
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(AcquireFailure::Held(LockMetadata::from_file(lock_path).ok()));
        }
        Err(e) => {
            return Err(AcquireFailure::Io(SeqLogError::IoFailure(format!(
                "failed to create lock file '{}': {}",
                lock_path.display(),
                e
            ))));
        }
    };

    let json = match metadata.to_json() {
        Ok(json) => json,
        Err(e) => {
            let _ = fs::remove_file(lock_path);
            return Err(AcquireFailure::Io(e));
        }
    };

    if let Err(e) = file.write_all(json.as_bytes()).and_then(|_| file.sync_all()) {
        let _ = fs::remove_file(lock_path);
        return Err(AcquireFailure::Io(SeqLogError::IoFailure(format!(
            "failed to write lock metadata: {}",
            e
        ))));
    }

    Ok(LockGuard::new(lock_path.to_path_buf()))
}

/// Acquire the exclusive lock for a log file.
///
/// Must be held for the entire scan + mutate + rewrite sequence. Stale
/// locks (unreadable metadata, or older than `config.lock_stale_minutes`)
/// are removed and acquisition retried; a live lock is retried
/// `config.lock_retries` times with `config.lock_wait_ms` sleeps, then
/// fails with `LockUnavailable` naming the holder. The log file itself is
/// never touched here.
pub fn acquire_log_lock(log_path: &Path, action: &str, config: &Config) -> Result<LockGuard> {
    let lock_path = lock_path_for(log_path)?;

    if let Some(parent) = lock_path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            SeqLogError::IoFailure(format!(
                "failed to create directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let mut attempts_left = config.lock_retries;
    let mut recovered_stale = false;

    loop {
        let holder = match try_create(&lock_path, &LockMetadata::new(action)) {
            Ok(guard) => return Ok(guard),
            Err(AcquireFailure::Io(e)) => return Err(e),
            Err(AcquireFailure::Held(holder)) => holder,
        };

        let stale = match &holder {
            None => true,
            Some(meta) => meta.is_stale(config.lock_stale_minutes),
        };

        // Recover an abandoned lock at most once, so a removal that keeps
        // failing cannot spin forever.
        if stale && !recovered_stale {
            recovered_stale = true;
            let _ = fs::remove_file(&lock_path);
            continue;
        }

        if attempts_left > 0 {
            attempts_left -= 1;
            std::thread::sleep(std::time::Duration::from_millis(config.lock_wait_ms));
            continue;
        }

        let holder_info = match holder {
            Some(meta) => format!(
                "\nLock: {} (created {} ago by {})\nAction: {}",
                lock_path.display(),
                meta.age_string(),
                meta.owner,
                meta.action
            ),
            None => format!("\nLock: {}", lock_path.display()),
        };
        return Err(SeqLogError::LockUnavailable(format!(
            "log is locked by another process{}",
            holder_info
        )));
    }
}

/// Inspect the lock for a log file, if one exists.
pub fn inspect_lock(log_path: &Path, config: &Config) -> Result<Option<LockInfo>> {
    let lock_path = lock_path_for(log_path)?;
    if !lock_path.exists() {
        return Ok(None);
    }

    let metadata = LockMetadata::from_file(&lock_path).ok();
    let is_stale = match &metadata {
        Some(meta) => meta.is_stale(config.lock_stale_minutes),
        None => true,
    };

    Ok(Some(LockInfo {
        path: lock_path,
        metadata,
        is_stale,
    }))
}

/// Remove the lock for a log file.
///
/// The caller is responsible for verifying that clearing is appropriate
/// (e.g. checking --force). Tolerates unreadable metadata so a corrupt
/// lock left by a crashed process can still be cleared.
pub fn clear_lock(log_path: &Path, config: &Config) -> Result<LockInfo> {
    let lock_path = lock_path_for(log_path)?;

    if !lock_path.exists() {
        return Err(SeqLogError::UserError(format!(
            "no lock exists at: {}",
            lock_path.display()
        )));
    }

    let metadata = LockMetadata::from_file(&lock_path).ok();
    let is_stale = match &metadata {
        Some(meta) => meta.is_stale(config.lock_stale_minutes),
        None => true,
    };

    fs::remove_file(&lock_path).map_err(|e| {
        SeqLogError::IoFailure(format!(
            "failed to clear lock '{}': {}",
            lock_path.display(),
            e
        ))
    })?;

    Ok(LockInfo {
        path: lock_path,
        metadata,
        is_stale,
    })
}
