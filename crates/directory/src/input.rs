//! The directory input: one scan plus one reconcile, never two at once.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::entry::EntryFactory;
use crate::error::{Error, Result};
use crate::reconciler::{Reconciler, ReconcilerConfig};
use crate::scanner::DirectoryScanner;
use crate::types::{PassReport, ScanOutcome};
use crate::worker::WorkerHost;

/// Scans a definition tree and keeps the host's readers in line with it.
pub struct DirectoryInput {
    scanner: Arc<DirectoryScanner>,
    reconciler: Mutex<Reconciler>,
}

impl DirectoryInput {
    /// Create an input from its parts.
    pub fn new(scanner: DirectoryScanner, reconciler: Reconciler) -> Self {
        Self {
            scanner: Arc::new(scanner),
            reconciler: Mutex::new(reconciler),
        }
    }

    /// Create an input for `root` with default loader and defaults.
    pub fn with_host(
        root: impl AsRef<Path>,
        entries: EntryFactory,
        host: Arc<dyn WorkerHost>,
        config: ReconcilerConfig,
    ) -> Self {
        Self::new(
            DirectoryScanner::new(root.as_ref(), entries),
            Reconciler::new(host, config),
        )
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.scanner.root()
    }

    /// Run one scan + reconcile pass.
    ///
    /// # Errors
    ///
    /// - `PassInProgress` if another pass is running; nothing is done
    /// - `WalkFailed` if the root cannot be walked; the running set is untouched
    /// - `DuplicateName` if a conflict aborted the pass
    pub async fn run_pass(&self) -> Result<PassReport> {
        let Ok(mut reconciler) = self.reconciler.try_lock() else {
            warn!(root = %self.root().display(), "Pass skipped, another one is in progress");
            return Err(Error::PassInProgress);
        };

        let ScanOutcome {
            specified,
            diagnostics,
        } = self.scan().await?;
        debug!(
            root = %self.root().display(),
            definitions = specified.len(),
            skipped = diagnostics.len(),
            "Scan complete"
        );

        let mut report = reconciler.reconcile(specified).await?;
        report.diagnostics = diagnostics;

        if !report.is_noop() || !report.diagnostics.is_empty() {
            info!(
                started = report.started().len(),
                stopped = report.stopped().len(),
                failed = report.actions_failed.len(),
                rejected = report.rejected.len(),
                skipped = report.diagnostics.len(),
                running = reconciler.running().len(),
                "Pass finished"
            );
        }

        Ok(report)
    }

    /// Names of the readers currently running, sorted.
    pub async fn running_names(&self) -> Vec<String> {
        let reconciler = self.reconciler.lock().await;
        let mut names: Vec<String> = reconciler
            .running()
            .names()
            .map(ToString::to_string)
            .collect();
        names.sort();
        names
    }

    async fn scan(&self) -> Result<ScanOutcome> {
        let scanner = Arc::clone(&self.scanner);
        tokio::task::spawn_blocking(move || scanner.scan())
            .await
            .map_err(|e| Error::ScanTaskFailed {
                reason: e.to_string(),
            })?
    }
}
