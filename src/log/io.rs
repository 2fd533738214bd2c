//! File I/O for the record log.

use super::SeqDataLog;
use crate::error::{Result, SeqLogError};
use std::path::Path;

impl SeqDataLog {
    /// Load a log file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SeqLogError::IoFailure(format!(
                "failed to read log file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    /// Load a log file, treating a missing file as an empty log.
    ///
    /// The log is created lazily on first add, so absence is not an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(SeqLogError::IoFailure(format!(
                "failed to read log file '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    /// Atomically save the log to disk.
    ///
    /// Uses atomic write (temp file + rename) so the log file is never
    /// visible in a half-written state and a failed write leaves the
    /// original intact.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        crate::fs::atomic_write_file(path, &self.to_string())
    }
}
