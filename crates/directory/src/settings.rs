//! Settings of the directory input itself.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::reconciler::{ConflictPolicy, ReconcilerConfig};

/// Default definition directory.
pub const DEFAULT_LOGSTREAMER_DIR: &str = "logstreamers.d";

/// Default seconds between passes.
pub const DEFAULT_TICKER_INTERVAL: u64 = 300;

/// Where definitions live and how often to look at them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorySettings {
    /// Root of the definition tree. Relative paths resolve against `share_dir`.
    pub logstreamer_dir: PathBuf,
    /// Seconds between passes.
    pub ticker_interval: u64,
    pub share_dir: Option<PathBuf>,
    /// Handling of two files that claim one reader name.
    ///
    /// Renaming a definition file counts as such a claim. Under the default
    /// `abort-pass` it ends the loop and with it the daemon; use
    /// `reject-file` to have the reader come back under the new file name on
    /// the next pass instead.
    pub conflict_policy: ConflictPolicy,
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            logstreamer_dir: PathBuf::from(DEFAULT_LOGSTREAMER_DIR),
            ticker_interval: DEFAULT_TICKER_INTERVAL,
            share_dir: None,
            conflict_policy: ConflictPolicy::default(),
        }
    }
}

impl DirectorySettings {
    /// Load settings from a TOML file; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| logstream_core::Error::file_read_failed(path, e.to_string()))?;
        let settings: Self = toml::from_str(&content)
            .map_err(|e| logstream_core::Error::toml_parse_failed(path, e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSettings` if the interval is zero or the directory is empty.
    pub fn validate(&self) -> Result<()> {
        if self.ticker_interval == 0 {
            return Err(Error::invalid_settings("ticker_interval must be greater than zero"));
        }
        if self.logstreamer_dir.as_os_str().is_empty() {
            return Err(Error::invalid_settings("logstreamer_dir must not be empty"));
        }
        Ok(())
    }

    /// Definition root with the share directory applied.
    #[must_use]
    pub fn resolved_dir(&self) -> PathBuf {
        match &self.share_dir {
            Some(share) if self.logstreamer_dir.is_relative() => share.join(&self.logstreamer_dir),
            _ => self.logstreamer_dir.clone(),
        }
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.ticker_interval)
    }

    #[must_use]
    pub const fn reconciler_config(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            conflict_policy: self.conflict_policy,
        }
    }
}
