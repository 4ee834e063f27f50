//! Reconciler implementation.
//!
//! One pass, in order:
//! 1. stop readers whose name no longer appears in the specified set
//! 2. refuse files that claim a name another file already runs under
//! 3. keep live readers whose configuration is unchanged, stop changed or
//!    exited ones
//! 4. start whatever is not running yet

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::entry::{Entry, RunningSet, SpecifiedSet};
use crate::error::{Error, Result};
use crate::types::{PassReport, ReconcileAction, StopReason};
use crate::worker::WorkerHost;

/// What to do when two files claim the same reader name.
///
/// A reader is tied to the file it was loaded from. Renaming or moving that
/// file makes the new path claim a name the old path still runs under, so a
/// rename is handled as a conflict like any other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Stop the running reader and fail the whole pass.
    ///
    /// The failure is fatal to the reconciliation loop, so renaming a
    /// definition file stops the daemon.
    #[default]
    AbortPass,
    /// Stop the running reader, skip the file, carry on with the pass.
    ///
    /// Files that share a name within one scan are all skipped until only
    /// one of them is left. A renamed file is skipped for one pass and
    /// started on the next.
    RejectFile,
}

/// Configuration for the reconciler.
#[derive(Debug, Clone, Default)]
pub struct ReconcilerConfig {
    pub conflict_policy: ConflictPolicy,
}

/// Keeps the running set in line with the specified set.
pub struct Reconciler {
    /// Host the readers run on.
    host: Arc<dyn WorkerHost>,
    /// Readers this reconciler registered.
    running: RunningSet,
    /// Configuration.
    config: ReconcilerConfig,
}

impl Reconciler {
    /// Create a new reconciler.
    pub fn new(host: Arc<dyn WorkerHost>, config: ReconcilerConfig) -> Self {
        Self {
            host,
            running: RunningSet::new(),
            config,
        }
    }

    /// Readers currently registered by this reconciler.
    #[must_use]
    pub const fn running(&self) -> &RunningSet {
        &self.running
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Apply one specified set.
    ///
    /// Not transactional: when a conflict aborts the pass, the effects applied
    /// before it (including removal of the conflicting reader) stay applied.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateName` when two files claim the same reader name and
    /// the policy is [`ConflictPolicy::AbortPass`].
    pub async fn reconcile(&mut self, specified: SpecifiedSet) -> Result<PassReport> {
        info!(
            specified = specified.len(),
            running = self.running.len(),
            "Starting reconciliation"
        );

        let mut report = PassReport::default();
        self.prune_removed(&specified, &mut report).await;

        let shared = match self.config.conflict_policy {
            ConflictPolicy::AbortPass => HashMap::new(),
            ConflictPolicy::RejectFile => shared_names(&specified),
        };

        let mut conflicted = false;
        for (path, entry) in specified {
            if let Some(files) = shared.get(entry.name()) {
                if self
                    .stop(entry.name(), StopReason::Conflict, &mut report)
                    .await
                {
                    conflicted = true;
                }
                let other_file = files
                    .iter()
                    .find(|file| **file != path)
                    .cloned()
                    .unwrap_or_default();
                let err = Error::shared_name(entry.name(), other_file, &path);
                warn!(error = %err, "Rejected reader definition");
                report.rejected.push((path, err.to_string()));
                continue;
            }

            let conflicting_file = self
                .running
                .get(entry.name())
                .filter(|running| running.source() != entry.source())
                .map(|running| running.source().to_path_buf());

            if let Some(running_file) = conflicting_file {
                self.stop(entry.name(), StopReason::Conflict, &mut report)
                    .await;
                let err = Error::duplicate_name(entry.name(), running_file, &path);
                error!(error = %err, "Conflicting reader definition");
                match self.config.conflict_policy {
                    ConflictPolicy::AbortPass => return Err(err),
                    ConflictPolicy::RejectFile => {
                        conflicted = true;
                        report.rejected.push((path, err.to_string()));
                        continue;
                    }
                }
            }

            if let Some(running) = self.running.get(entry.name()) {
                let reason = if self.host.is_live(running.handle()).await {
                    if !conflicted && running.is_equivalent(&entry) {
                        debug!(reader = entry.name(), "Unchanged");
                        report.unchanged.push(entry.name().to_string());
                        continue;
                    }
                    StopReason::Changed
                } else {
                    StopReason::Exited
                };
                self.stop(entry.name(), reason, &mut report).await;
            }

            self.start(entry, &mut report).await;
        }

        if report.is_noop() {
            debug!(running = self.running.len(), "Nothing to do");
        } else {
            info!(
                actions_taken = report.actions_taken.len(),
                actions_failed = report.actions_failed.len(),
                rejected = report.rejected.len(),
                running = self.running.len(),
                "Reconciliation complete"
            );
        }

        Ok(report)
    }

    /// Step 1: stop every reader no specified entry names.
    async fn prune_removed(&mut self, specified: &SpecifiedSet, report: &mut PassReport) {
        let wanted: HashSet<&str> = specified.values().map(Entry::name).collect();
        let stale: Vec<String> = self
            .running
            .names()
            .filter(|name| !wanted.contains(name))
            .map(ToString::to_string)
            .collect();

        for name in stale {
            self.stop(&name, StopReason::Removed, report).await;
        }
    }

    /// Stop `name` if it runs. Returns whether it did.
    async fn stop(&mut self, name: &str, reason: StopReason, report: &mut PassReport) -> bool {
        let Some(entry) = self.running.remove(name) else {
            return false;
        };
        self.host.remove_worker(entry.handle()).await;
        info!(
            reader = name,
            file = %entry.source().display(),
            reason = ?reason,
            "Removed"
        );
        report.actions_taken.push(ReconcileAction::Stop {
            name: name.to_string(),
            reason,
        });
        true
    }

    async fn start(&mut self, entry: Entry, report: &mut PassReport) {
        let action = ReconcileAction::Start {
            name: entry.name().to_string(),
            file: entry.source().to_path_buf(),
        };

        match self.host.add_worker(entry.handle().clone()).await {
            Ok(()) => {
                info!(reader = entry.name(), file = %entry.source().display(), "Added");
                self.running.insert(entry);
                report.actions_taken.push(action);
            }
            Err(e) => {
                warn!(
                    action = %action.description(),
                    error = %e,
                    "Failed to start reader"
                );
                report.actions_failed.push((action, e.to_string()));
            }
        }
    }
}

/// Names declared by more than one file, with those files in path order.
fn shared_names(specified: &SpecifiedSet) -> HashMap<String, Vec<PathBuf>> {
    specified
        .iter()
        .map(|(path, entry)| (entry.name().to_string(), path.clone()))
        .into_group_map()
        .into_iter()
        .filter(|(_, files)| files.len() > 1)
        .collect()
}

/// Builder for Reconciler.
pub struct ReconcilerBuilder {
    host: Option<Arc<dyn WorkerHost>>,
    config: ReconcilerConfig,
}

impl ReconcilerBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            host: None,
            config: ReconcilerConfig::default(),
        }
    }

    /// Set the host.
    #[must_use]
    pub fn with_host(mut self, host: Arc<dyn WorkerHost>) -> Self {
        self.host = Some(host);
        self
    }

    /// Set the conflict policy.
    #[must_use]
    pub const fn conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.config.conflict_policy = policy;
        self
    }

    /// Build the reconciler.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSettings` if no host was set.
    pub fn build(self) -> Result<Reconciler> {
        let host = self
            .host
            .ok_or_else(|| Error::invalid_settings("a worker host is required"))?;
        Ok(Reconciler::new(host, self.config))
    }
}

impl Default for ReconcilerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
