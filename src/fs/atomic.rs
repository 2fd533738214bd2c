//! Atomic file replacement.
//!
//! The log file must never be observable in a half-written state, and a
//! failed rewrite must never leave the original deleted or truncated.
//! Every write therefore goes through the same sequence:
//!
//! 1. Write the full new content to a temporary file in the same directory
//!    (same filesystem, so the rename below stays atomic)
//! 2. fsync the temporary file
//! 3. Rename it over the target
//!
//! On crash a stray `.{filename}.tmp` may remain next to the target; the
//! target itself is either the old content or the new content, never a mix.

use crate::error::{Result, SeqLogError};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Atomically write bytes to a file.
///
/// The target's parent directory is created if missing. The original file
/// is only replaced once the temporary file is fully written and synced;
/// any failure before the final rename leaves the original untouched.
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            SeqLogError::IoFailure(format!(
                "failed to create parent directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let temp_path = temp_path_for(path)?;
    write_and_sync(&temp_path, content)?;
    replace_file(&temp_path, path)
}

/// Atomically write a string to a file.
pub fn atomic_write_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

/// Temporary sibling path for the target: `.{filename}.tmp` in the same
/// directory.
fn temp_path_for(target: &Path) -> Result<PathBuf> {
    let parent = target.parent().unwrap_or(Path::new("."));
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            SeqLogError::IoFailure(format!("invalid file path: {}", target.display()))
        })?;
    Ok(parent.join(format!(".{}.tmp", filename)))
}

/// Write content to the temporary file and sync it to disk.
///
/// The temporary file is removed again on any failure.
fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| {
        SeqLogError::IoFailure(format!(
            "failed to create temporary file '{}': {}",
            path.display(),
            e
        ))
    })?;

    file.write_all(content).map_err(|e| {
        let _ = fs::remove_file(path);
        SeqLogError::IoFailure(format!("failed to write temporary file: {}", e))
    })?;

    file.sync_all().map_err(|e| {
        let _ = fs::remove_file(path);
        SeqLogError::IoFailure(format!("failed to sync temporary file to disk: {}", e))
    })?;

    Ok(())
}

/// Replace the target with the fully-written temporary file.
///
/// On unix, rename() replaces an existing destination atomically. Syncing
/// the parent directory afterwards persists the directory entry itself.
#[cfg(unix)]
fn replace_file(source: &Path, target: &Path) -> Result<()> {
    fs::rename(source, target).map_err(|e| {
        let _ = fs::remove_file(source);
        SeqLogError::IoFailure(format!(
            "failed to replace '{}': {}",
            target.display(),
            e
        ))
    })?;

    if let Some(parent) = target.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }

    Ok(())
}

/// Non-unix fallback. rename() refuses to clobber an existing destination
/// on some platforms, so remove the target first. Not atomic, but the new
/// content is already durable in the temporary file before the target is
/// touched.
#[cfg(not(unix))]
fn replace_file(source: &Path, target: &Path) -> Result<()> {
    if target.exists() {
        fs::remove_file(target).map_err(|e| {
            let _ = fs::remove_file(source);
            SeqLogError::IoFailure(format!(
                "failed to remove '{}' before replace: {}",
                target.display(),
                e
            ))
        })?;
    }
    fs::rename(source, target).map_err(|e| {
        let _ = fs::remove_file(source);
        SeqLogError::IoFailure(format!(
            "failed to replace '{}': {}",
            target.display(),
            e
        ))
    })
}
