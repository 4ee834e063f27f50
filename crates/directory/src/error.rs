//! Error types for the directory reconciler.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for reconciler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reconciler error types.
#[derive(Debug, Error)]
pub enum Error {
    /// The root directory could not be walked at all.
    #[error("cannot walk '{path}': {reason}")]
    WalkFailed { path: PathBuf, reason: String },

    /// Two files declare the same reader name.
    #[error(
        "duplicate name: reader [{name}] already exists (from '{running_file}'); not loading file '{file}'"
    )]
    DuplicateName {
        name: String,
        running_file: PathBuf,
        file: PathBuf,
    },

    /// Two files of one scan declare the same reader name.
    #[error(
        "duplicate name: reader [{name}] is also declared in '{other_file}'; not loading file '{file}'"
    )]
    SharedName {
        name: String,
        other_file: PathBuf,
        file: PathBuf,
    },

    /// Another pass holds the execution token.
    #[error("a reconciliation pass is already in progress")]
    PassInProgress,

    /// The host refused to register a reader.
    #[error("host rejected reader '{name}': {reason}")]
    WorkerRejected { name: String, reason: String },

    /// The host already runs a reader under this name.
    #[error("reader '{name}' is already registered")]
    AlreadyRegistered { name: String },

    /// The blocking scan task died.
    #[error("scan task failed: {reason}")]
    ScanTaskFailed { reason: String },

    /// Settings of the directory input are unusable.
    #[error("invalid settings: {reason}")]
    InvalidSettings { reason: String },

    /// Definition loading or preparation failed.
    #[error(transparent)]
    Core(#[from] logstream_core::Error),
}

impl Error {
    /// Create a walk failure.
    pub fn walk_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::WalkFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a duplicate name conflict.
    pub fn duplicate_name(
        name: impl Into<String>,
        running_file: impl Into<PathBuf>,
        file: impl Into<PathBuf>,
    ) -> Self {
        Self::DuplicateName {
            name: name.into(),
            running_file: running_file.into(),
            file: file.into(),
        }
    }

    /// Create a conflict between two files of the same scan.
    pub fn shared_name(
        name: impl Into<String>,
        other_file: impl Into<PathBuf>,
        file: impl Into<PathBuf>,
    ) -> Self {
        Self::SharedName {
            name: name.into(),
            other_file: other_file.into(),
            file: file.into(),
        }
    }

    /// Create a host rejection.
    pub fn worker_rejected(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::WorkerRejected {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an already-registered error.
    pub fn already_registered(name: impl Into<String>) -> Self {
        Self::AlreadyRegistered { name: name.into() }
    }

    /// Create an invalid settings error.
    pub fn invalid_settings(reason: impl Into<String>) -> Self {
        Self::InvalidSettings {
            reason: reason.into(),
        }
    }

    /// Whether this error must end the control loop.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::PassInProgress)
    }
}
