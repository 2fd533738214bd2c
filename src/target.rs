//! Target directory collaborators.
//!
//! The log engine works on absolute, canonicalized directory paths and
//! integer UNIX timestamps; this module supplies both. Kept separate from
//! the engine so the path/time plumbing can be swapped without touching
//! the mutation logic.

use crate::error::{Result, SeqLogError};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Resolve a user-supplied path to the canonical absolute path of an
/// existing directory.
///
/// Symlinks and relative segments are resolved. A missing path fails with
/// `TargetNotFound`; an existing non-directory fails with `UserError`.
pub fn resolve_dir(path: &Path) -> Result<PathBuf> {
    let resolved = std::fs::canonicalize(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SeqLogError::TargetNotFound(path.display().to_string())
        } else {
            SeqLogError::IoFailure(format!("failed to resolve '{}': {}", path.display(), e))
        }
    })?;

    if !resolved.is_dir() {
        return Err(SeqLogError::UserError(format!(
            "not a directory: {}",
            path.display()
        )));
    }

    Ok(resolved)
}

/// Resolve a path into a log key for delete operations.
///
/// Deletes may legitimately target directories that no longer exist, where
/// canonicalization is impossible; those fall back to joining the current
/// working directory lexically, matching how the path was originally
/// recorded once its directory is gone.
pub fn resolve_key(path: &Path) -> Result<PathBuf> {
    match std::fs::canonicalize(path) {
        Ok(resolved) => Ok(resolved),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if path.is_absolute() {
                Ok(path.to_path_buf())
            } else {
                let cwd = std::env::current_dir().map_err(|e| {
                    SeqLogError::IoFailure(format!(
                        "failed to get current working directory: {}",
                        e
                    ))
                })?;
                Ok(cwd.join(path))
            }
        }
        Err(e) => Err(SeqLogError::IoFailure(format!(
            "failed to resolve '{}': {}",
            path.display(),
            e
        ))),
    }
}

/// UNIX timestamp characterizing a directory: its modification time.
///
/// Consumed on add/update only. Pre-epoch modification times map to
/// negative values rather than failing.
pub fn dir_timestamp(path: &Path) -> Result<i64> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        SeqLogError::IoFailure(format!("failed to stat '{}': {}", path.display(), e))
    })?;

    let modified = metadata.modified().map_err(|e| {
        SeqLogError::IoFailure(format!(
            "failed to read modification time of '{}': {}",
            path.display(),
            e
        ))
    })?;

    Ok(match modified.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn resolve_dir_canonicalizes_existing_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("run1");
        std::fs::create_dir(&dir).unwrap();

        let resolved = resolve_dir(&dir).unwrap();
        assert!(resolved.is_absolute());
        assert_eq!(resolved, dir.canonicalize().unwrap());
    }

    #[test]
    fn resolve_dir_missing_path_is_target_not_found() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("no-such-run");

        let err = resolve_dir(&missing).unwrap_err();
        assert!(matches!(err, SeqLogError::TargetNotFound(_)));
    }

    #[test]
    fn resolve_dir_rejects_plain_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("data.txt");
        std::fs::write(&file, "x").unwrap();

        let err = resolve_dir(&file).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn resolve_key_keeps_vanished_absolute_path() {
        let temp = TempDir::new().unwrap();
        let gone = temp.path().join("vanished-run");

        let key = resolve_key(&gone).unwrap();
        assert_eq!(key, gone);
    }

    #[test]
    fn resolve_key_absolutizes_vanished_relative_path() {
        let key = resolve_key(Path::new("definitely-not-a-real-dir-12345")).unwrap();
        assert!(key.is_absolute());
        assert!(key.ends_with("definitely-not-a-real-dir-12345"));
    }

    #[test]
    fn resolve_key_canonicalizes_when_possible() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("run1");
        std::fs::create_dir(&dir).unwrap();

        let key = resolve_key(&dir).unwrap();
        assert_eq!(key, dir.canonicalize().unwrap());
    }

    #[test]
    fn dir_timestamp_matches_modification_time() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("run1");
        std::fs::create_dir(&dir).unwrap();

        let ts = dir_timestamp(&dir).unwrap();
        let expected = std::fs::metadata(&dir)
            .unwrap()
            .modified()
            .unwrap()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64;
        assert_eq!(ts, expected);
        assert!(ts > 0);
    }

    #[test]
    fn dir_timestamp_missing_path_fails() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("no-such-run");

        let err = dir_timestamp(&missing).unwrap_err();
        assert!(matches!(err, SeqLogError::IoFailure(_)));
    }
}
