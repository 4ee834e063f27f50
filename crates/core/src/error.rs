//! Core error types for loading and preparing stream reader definitions.
//!
//! All errors are explicit, typed, and recoverable - no panics allowed.

use std::path::PathBuf;

use thiserror::Error;

/// Core error type for definition handling.
#[derive(Debug, Error)]
pub enum Error {
    // I/O errors
    #[error("failed to read file '{path}': {reason}")]
    FileReadFailed { path: PathBuf, reason: String },

    // Parsing errors
    #[error("TOML parse error in '{path}': {reason}")]
    TomlParseFailed { path: PathBuf, reason: String },

    #[error("no `{expected}` section in '{path}'")]
    NoMatchingSection { path: PathBuf, expected: String },

    #[error("'{path}' declares more than one `{expected}` section: {}", sections.join(", "))]
    AmbiguousSection {
        path: PathBuf,
        expected: String,
        sections: Vec<String>,
    },

    #[error("invalid section '{section}' in '{path}': {reason}")]
    InvalidSection {
        path: PathBuf,
        section: String,
        reason: String,
    },

    // Validation errors
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // Reader errors
    #[error("stream reader '{name}' failed: {reason}")]
    ReaderFailed { name: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a file read error.
    pub fn file_read_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::FileReadFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a TOML parse error.
    pub fn toml_parse_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::TomlParseFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing section error.
    pub fn no_matching_section(path: impl Into<PathBuf>, expected: impl Into<String>) -> Self {
        Self::NoMatchingSection {
            path: path.into(),
            expected: expected.into(),
        }
    }

    /// Create an ambiguous section error.
    pub fn ambiguous_section(
        path: impl Into<PathBuf>,
        expected: impl Into<String>,
        sections: Vec<String>,
    ) -> Self {
        Self::AmbiguousSection {
            path: path.into(),
            expected: expected.into(),
            sections,
        }
    }

    /// Create an invalid section error.
    pub fn invalid_section(
        path: impl Into<PathBuf>,
        section: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidSection {
            path: path.into(),
            section: section.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid config error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create a reader failure.
    pub fn reader_failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ReaderFailed {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
