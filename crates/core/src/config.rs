//! Stream reader definitions.
//!
//! # Example definition
//!
//! ```toml
//! [syslog]
//! type = "LogstreamerInput"
//! log_directory = "/var/log"
//! file_match = '(?P<Name>syslog)\.?(?P<Seq>\d*)'
//! priority = ["^Seq"]
//! differentiator = ["Name"]
//!
//! [syslog.translation.Month]
//! jan = 1
//! feb = 2
//!
//! [syslog.retries]
//! max_retries = 5
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::retry::RetryOptions;
use crate::{Error, Result};

/// Splitter used when a definition does not name one.
pub const DEFAULT_SPLITTER: &str = "TokenSplitter";

/// Submatch name -> (token -> replacement value).
pub type TranslationMap = HashMap<String, HashMap<String, i64>>;

// ═══════════════════════════════════════════════════════════════════════════
// WORKER CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════

/// Desired behaviour of one stream reader.
///
/// Replaced, never mutated, whenever its backing file changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub hostname: String,
    pub log_directory: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal_directory: Option<PathBuf>,
    pub file_match: String,
    pub priority: Vec<String>,
    pub differentiator: Vec<String>,
    pub translation: TranslationMap,
    #[serde(with = "humantime_serde")]
    pub rescan_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub check_data_interval: Duration,
    pub splitter: String,
    pub initial_tail: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            log_directory: PathBuf::from("/var/log"),
            journal_directory: None,
            file_match: String::new(),
            priority: Vec::new(),
            differentiator: Vec::new(),
            translation: HashMap::new(),
            rescan_interval: Duration::from_secs(60),
            check_data_interval: Duration::from_millis(250),
            splitter: DEFAULT_SPLITTER.to_string(),
            initial_tail: false,
        }
    }
}

impl WorkerConfig {
    /// Structural equivalence.
    ///
    /// Scalars must match, `priority` and `differentiator` must hold the same
    /// elements in the same order, and `translation` must hold the same keys
    /// and values regardless of the order they were declared in.
    #[must_use]
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self == other
    }

    /// Check the definition can drive a reader.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `file_match` is empty or not a valid regex,
    /// or if an interval is zero.
    pub fn validate(&self) -> Result<()> {
        if self.file_match.is_empty() {
            return Err(Error::invalid_config("file_match is required"));
        }
        Regex::new(&self.file_match).map_err(|e| {
            Error::invalid_config(format!("file_match '{}': {e}", self.file_match))
        })?;
        if self.rescan_interval.is_zero() {
            return Err(Error::invalid_config("rescan_interval must be positive"));
        }
        if self.check_data_interval.is_zero() {
            return Err(Error::invalid_config("check_data_interval must be positive"));
        }
        if let Some(token) = self.priority.iter().find(|p| p.trim_start_matches('^').is_empty()) {
            return Err(Error::invalid_config(format!(
                "priority entry '{token}' names no submatch"
            )));
        }
        Ok(())
    }
}

/// Settings every input shares, before managed defaults are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonWorkerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<RetryOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_exit: Option<bool>,
}

// ═══════════════════════════════════════════════════════════════════════════
// PREPARED CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════

/// A definition with every managed setting resolved, ready to build a reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparedConfig {
    /// Declared reader name (the section name, not the file path).
    pub name: String,
    /// Declared type tag.
    pub worker_type: String,
    pub worker: WorkerConfig,
    pub retries: RetryOptions,
    /// Whether the reader may finish on its own without being restarted.
    pub can_exit: bool,
}

impl PreparedConfig {
    /// Whether two prepared definitions would produce the same reader.
    #[must_use]
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.name == other.name
            && self.worker_type == other.worker_type
            && self.worker.is_equivalent(&other.worker)
            && self.retries == other.retries
            && self.can_exit == other.can_exit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_priority(priority: &[&str]) -> WorkerConfig {
        WorkerConfig {
            file_match: r"(?P<Seq>\d+)\.log".to_string(),
            priority: priority.iter().map(ToString::to_string).collect(),
            ..WorkerConfig::default()
        }
    }

    #[test]
    fn identical_priority_lists_are_equivalent() {
        let a = config_with_priority(&["a", "b"]);
        let b = config_with_priority(&["a", "b"]);
        assert!(a.is_equivalent(&b));
    }

    #[test]
    fn priority_order_matters() {
        let a = config_with_priority(&["a", "b"]);
        let b = config_with_priority(&["b", "a"]);
        assert!(!a.is_equivalent(&b));
    }

    #[test]
    fn priority_length_matters() {
        let a = config_with_priority(&["a", "b"]);
        let b = config_with_priority(&["a", "b", "c"]);
        assert!(!a.is_equivalent(&b));
        assert!(!b.is_equivalent(&a));
    }

    #[test]
    fn translation_insertion_order_is_irrelevant() {
        let mut a = config_with_priority(&[]);
        let mut b = config_with_priority(&[]);
        a.translation.insert(
            "Month".to_string(),
            HashMap::from([("jan".to_string(), 1), ("feb".to_string(), 2)]),
        );
        b.translation.insert(
            "Month".to_string(),
            HashMap::from([("feb".to_string(), 2), ("jan".to_string(), 1)]),
        );
        assert!(a.is_equivalent(&b));
    }

    #[test]
    fn translation_extra_key_breaks_equivalence_both_ways() {
        let mut a = config_with_priority(&[]);
        let mut b = config_with_priority(&[]);
        a.translation
            .insert("Month".to_string(), HashMap::from([("jan".to_string(), 1)]));
        b.translation.insert(
            "Month".to_string(),
            HashMap::from([("jan".to_string(), 1), ("feb".to_string(), 2)]),
        );
        assert!(!a.is_equivalent(&b));
        assert!(!b.is_equivalent(&a));
    }

    #[test]
    fn scalar_difference_breaks_equivalence() {
        let a = config_with_priority(&[]);
        let b = WorkerConfig {
            initial_tail: true,
            ..a.clone()
        };
        assert!(!a.is_equivalent(&b));
    }

    #[test]
    fn decode_applies_field_defaults() -> std::result::Result<(), toml::de::Error> {
        let config: WorkerConfig = toml::from_str(
            r#"
            file_match = 'app\.log'
            rescan_interval = "5m"
            "#,
        )?;
        assert_eq!(config.rescan_interval, Duration::from_secs(300));
        assert_eq!(config.check_data_interval, Duration::from_millis(250));
        assert_eq!(config.splitter, DEFAULT_SPLITTER);
        assert_eq!(config.log_directory, PathBuf::from("/var/log"));
        Ok(())
    }

    #[test]
    fn validate_rejects_bad_regex() {
        let config = WorkerConfig {
            file_match: "(unclosed".to_string(),
            ..WorkerConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn validate_requires_file_match() {
        assert!(WorkerConfig::default().validate().is_err());
    }

    #[test]
    fn validate_accepts_complete_definition() {
        assert!(config_with_priority(&["^Seq"]).validate().is_ok());
    }
}
