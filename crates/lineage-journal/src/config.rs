// crates/lineage-journal/src/config.rs
//
// Journal configuration.
// Loaded from a TOML file or populated with sensible defaults.

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::JournalError;

/// What replay does with a lineage entry that fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorruptEntryPolicy {
    /// Stop replay and return the error.
    #[default]
    Abort,
    /// Log the entry and continue with the next one.
    Skip,
}

/// Runtime configuration for the lineage journal.
#[derive(Debug, Clone, Deserialize)]
pub struct JournalConfig {
    /// Directory holding the journal file. A leading `~/` expands to the home directory.
    #[serde(default = "default_journal_dir")]
    pub journal_dir: String,

    /// Journal file name inside `journal_dir`.
    #[serde(default = "default_file_name")]
    pub file_name: String,

    /// Sync file data to disk after every append.
    #[serde(default = "default_sync_on_append")]
    pub sync_on_append: bool,

    /// Replay behaviour for corrupt lineage entries: "abort" or "skip".
    #[serde(default)]
    pub on_corrupt_entry: CorruptEntryPolicy,

    /// Treat a truncated final frame as the end of the journal.
    #[serde(default = "default_tolerate_torn_tail")]
    pub tolerate_torn_tail: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_journal_dir() -> String {
    "~/.lineage/journal".to_string()
}

fn default_file_name() -> String {
    "lineage.journal".to_string()
}

fn default_sync_on_append() -> bool {
    true
}

fn default_tolerate_torn_tail() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            journal_dir: default_journal_dir(),
            file_name: default_file_name(),
            sync_on_append: default_sync_on_append(),
            on_corrupt_entry: CorruptEntryPolicy::default(),
            tolerate_torn_tail: default_tolerate_torn_tail(),
            log_level: default_log_level(),
        }
    }
}

impl JournalConfig {
    /// Load configuration from a TOML file at the given path.
    pub fn load(path: &str) -> Result<Self, JournalError> {
        let contents = fs::read_to_string(expand_tilde(path))?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, JournalError> {
        let config: JournalConfig =
            toml::from_str(contents).map_err(|e| JournalError::Config(e.to_string()))?;
        if config.file_name.is_empty() {
            return Err(JournalError::Config("file_name must not be empty".to_string()));
        }
        Ok(config)
    }

    /// Full path of the journal file.
    pub fn journal_path(&self) -> PathBuf {
        PathBuf::from(expand_tilde(&self.journal_dir)).join(&self.file_name)
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).to_string_lossy().into_owned();
        }
    }
    path.to_string()
}
