//! Configuration for seqlog.
//!
//! Settings live in an optional YAML file. Lookup order: the `--config`
//! flag, then a `seqlog.yaml` next to the log file, then built-in
//! defaults. Unknown fields are ignored for forward compatibility.

use crate::error::{Result, SeqLogError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name searched for next to the log file.
pub const DEFAULT_CONFIG_FILENAME: &str = "seqlog.yaml";

/// Configuration values for lock handling and auditing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// A lock older than this many minutes is treated as abandoned and
    /// recovered during acquisition.
    #[serde(default = "default_lock_stale_minutes")]
    pub lock_stale_minutes: u32,

    /// Extra acquisition attempts after the first fails against a live lock.
    #[serde(default = "default_lock_retries")]
    pub lock_retries: u32,

    /// Sleep between acquisition attempts, in milliseconds.
    #[serde(default = "default_lock_wait_ms")]
    pub lock_wait_ms: u64,

    /// Whether to append audit events next to the log file.
    #[serde(default = "default_true")]
    pub log_events: bool,
}

fn default_lock_stale_minutes() -> u32 {
    15
}

fn default_lock_retries() -> u32 {
    3
}

fn default_lock_wait_ms() -> u64 {
    250
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock_stale_minutes: default_lock_stale_minutes(),
            lock_retries: default_lock_retries(),
            lock_wait_ms: default_lock_wait_ms(),
            log_events: default_true(),
        }
    }
}

impl Config {
    /// Load config from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            SeqLogError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| SeqLogError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            SeqLogError::UserError(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Resolve the effective config for an operation on `log_path`.
    ///
    /// An explicit `--config` path must load successfully; the implicit
    /// sibling `seqlog.yaml` is used only when present.
    pub fn resolve(explicit: Option<&Path>, log_path: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let sibling = log_path
            .parent()
            .unwrap_or(Path::new("."))
            .join(DEFAULT_CONFIG_FILENAME);
        if sibling.is_file() {
            return Self::load(&sibling);
        }

        Ok(Self::default())
    }

    /// Validate config values.
    pub fn validate(&self) -> Result<()> {
        if self.lock_stale_minutes == 0 {
            return Err(SeqLogError::UserError(
                "config validation failed: lock_stale_minutes must be greater than 0".to_string(),
            ));
        }

        if self.lock_wait_ms == 0 && self.lock_retries > 0 {
            return Err(SeqLogError::UserError(
                "config validation failed: lock_wait_ms must be greater than 0 when lock_retries is set"
                    .to_string(),
            ));
        }

        Ok(())
    }
}
