//! Dry-run stream reader.
//!
//! Logs what it would tail and then idles until stopped. Stands in for a
//! tailing backend so the reconciliation side can run on its own.

use std::sync::Arc;

use async_trait::async_trait;
use logstream_core::PreparedConfig;
use logstream_directory::{ReaderFactory, StreamReader};
use tokio::sync::watch;
use tracing::info;

pub struct DryRunReader {
    config: PreparedConfig,
}

impl DryRunReader {
    #[must_use]
    pub const fn new(config: PreparedConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl StreamReader for DryRunReader {
    async fn run(&self, mut stop: watch::Receiver<bool>) -> logstream_core::Result<()> {
        let worker = &self.config.worker;
        info!(
            reader = %self.config.name,
            log_directory = %worker.log_directory.display(),
            file_match = %worker.file_match,
            priority = ?worker.priority,
            "Dry-run reader started"
        );
        // Closed channel means the host is gone.
        let _ = stop.wait_for(|stopped| *stopped).await;
        info!(reader = %self.config.name, "Dry-run reader stopped");
        Ok(())
    }
}

/// Builds a [`DryRunReader`] for every definition.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunReaderFactory;

impl ReaderFactory for DryRunReaderFactory {
    fn make_reader(&self, config: &PreparedConfig) -> logstream_core::Result<Arc<dyn StreamReader>> {
        Ok(Arc::new(DryRunReader::new(config.clone())))
    }
}
