//! Outcome types for scans and passes.

use std::path::PathBuf;

use serde::Serialize;

use crate::entry::SpecifiedSet;

/// Non-fatal problem met while scanning; the offending path was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanDiagnostic {
    pub path: PathBuf,
    pub message: String,
}

impl ScanDiagnostic {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of one directory scan.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Desired entries keyed by file path.
    pub specified: SpecifiedSet,
    /// Files that were skipped and why.
    pub diagnostics: Vec<ScanDiagnostic>,
}

/// Why a reader was stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// No file declares the reader any more.
    Removed,
    /// Its file now declares a different configuration.
    Changed,
    /// A second file claims the same name.
    Conflict,
    /// The reader ended on its own and is due a fresh start.
    Exited,
}

/// Lifecycle actions the reconciler takes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReconcileAction {
    /// Register a reader with the host.
    Start { name: String, file: PathBuf },
    /// Remove a reader from the host.
    Stop { name: String, reason: StopReason },
}

impl ReconcileAction {
    /// Reader this action targets.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Start { name, .. } | Self::Stop { name, .. } => name,
        }
    }

    /// Get a description of the action.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Start { name, file } => format!("start {name} ({})", file.display()),
            Self::Stop { name, reason } => format!("stop {name}: {reason:?}"),
        }
    }
}

/// Result of one scan + reconcile pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PassReport {
    /// Actions that were applied.
    pub actions_taken: Vec<ReconcileAction>,
    /// Starts the host refused, with the reason.
    pub actions_failed: Vec<(ReconcileAction, String)>,
    /// Readers left running because nothing changed.
    pub unchanged: Vec<String>,
    /// Files refused over a reader name conflict, with the reason.
    pub rejected: Vec<(PathBuf, String)>,
    /// Files the scan skipped.
    pub diagnostics: Vec<ScanDiagnostic>,
}

impl PassReport {
    /// Whether the pass changed nothing and hit no problems.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.actions_taken.is_empty() && self.actions_failed.is_empty() && self.rejected.is_empty()
    }

    /// Names of readers started during the pass.
    #[must_use]
    pub fn started(&self) -> Vec<&str> {
        self.actions_taken
            .iter()
            .filter(|a| matches!(a, ReconcileAction::Start { .. }))
            .map(ReconcileAction::name)
            .collect()
    }

    /// Names of readers stopped during the pass.
    #[must_use]
    pub fn stopped(&self) -> Vec<&str> {
        self.actions_taken
            .iter()
            .filter(|a| matches!(a, ReconcileAction::Stop { .. }))
            .map(ReconcileAction::name)
            .collect()
    }
}
