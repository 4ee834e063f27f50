//! Configuration preparation: decoded record -> prepared config.
//!
//! Managed settings are filled in here, after decoding, and only where the
//! definition left them unset.

use logstream_core::{CommonWorkerConfig, PreparedConfig, RetryOptions};

use crate::loader::LoadedRecord;

/// Settings this crate manages on behalf of every reader it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedDefaults {
    pub retries: RetryOptions,
    pub can_exit: bool,
}

impl Default for ManagedDefaults {
    fn default() -> Self {
        Self {
            retries: RetryOptions::default(),
            can_exit: true,
        }
    }
}

impl ManagedDefaults {
    /// Resolve the common settings of a definition.
    #[must_use]
    pub fn apply(&self, common: CommonWorkerConfig) -> (RetryOptions, bool) {
        (
            common.retries.unwrap_or_else(|| self.retries.clone()),
            common.can_exit.unwrap_or(self.can_exit),
        )
    }

    /// Turn a loaded record into a prepared configuration.
    #[must_use]
    pub fn prepare(&self, record: LoadedRecord) -> PreparedConfig {
        let (retries, can_exit) = self.apply(record.common);
        PreparedConfig {
            name: record.name,
            worker_type: record.worker_type,
            worker: record.worker,
            retries,
            can_exit,
        }
    }
}
