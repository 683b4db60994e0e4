//! File paths for composer state
//!
//! CLI tools use XDG paths for cross-platform consistency. The data directory
//! holds the policy snapshot, the trace log and the feedback log.

use std::path::{Path, PathBuf};

/// Get the composer config directory.
///
/// Returns `$XDG_CONFIG_HOME/composer` if set, otherwise `~/.config/composer`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join("composer")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".config/composer")
    } else {
        PathBuf::from(".config/composer")
    }
}

/// Get the composer data directory.
///
/// Returns `$XDG_DATA_HOME/composer` if set, otherwise `~/.local/share/composer`.
pub fn data_dir() -> PathBuf {
    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg_data).join("composer")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".local/share/composer")
    } else {
        PathBuf::from(".local/share/composer")
    }
}

/// Composer file paths rooted at one data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerPaths {
    /// Base data directory
    pub data_dir: PathBuf,
    /// Policy snapshot (JSON)
    pub policy_path: PathBuf,
    /// Append-only composition traces (JSONL)
    pub traces_path: PathBuf,
    /// Append-only user feedback (JSONL)
    pub feedback_path: PathBuf,
}

impl ComposerPaths {
    /// Create paths from a custom base directory
    pub fn from_base(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        Self {
            policy_path: data_dir.join("policy.json"),
            traces_path: data_dir.join("traces.jsonl"),
            feedback_path: data_dir.join("feedback.jsonl"),
            data_dir,
        }
    }

    /// Ensure the data directory exists
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)
    }
}

impl Default for ComposerPaths {
    fn default() -> Self {
        Self::from_base(data_dir())
    }
}
