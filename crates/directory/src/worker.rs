//! Reader lifecycle seams: what a reader is, how one is built, who runs it.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use logstream_core::PreparedConfig;
use tokio::sync::watch;

use crate::error::Result;

/// A long-running stream reader.
#[async_trait]
pub trait StreamReader: Send + Sync {
    /// Run until `stop` turns `true` or the reader finishes on its own.
    async fn run(&self, stop: watch::Receiver<bool>) -> logstream_core::Result<()>;
}

/// Builds readers from prepared configuration.
pub trait ReaderFactory: Send + Sync {
    /// Construct the reader for `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration cannot back a reader.
    fn make_reader(&self, config: &PreparedConfig) -> logstream_core::Result<Arc<dyn StreamReader>>;
}

/// Registry that runs readers, used exclusively by the reconciler.
#[async_trait]
pub trait WorkerHost: Send + Sync {
    /// Start running `handle`.
    async fn add_worker(&self, handle: WorkerHandle) -> Result<()>;

    /// Stop `handle` and forget it.
    async fn remove_worker(&self, handle: &WorkerHandle);

    /// Whether `handle` is registered and its reader has not ended on its own.
    async fn is_live(&self, handle: &WorkerHandle) -> bool;
}

/// A reader plus the identity it runs under.
#[derive(Clone)]
pub struct WorkerHandle {
    config: Arc<PreparedConfig>,
    reader: Arc<dyn StreamReader>,
    transient: bool,
}

impl WorkerHandle {
    /// Wrap an already built reader.
    pub fn new(config: PreparedConfig, reader: Arc<dyn StreamReader>) -> Self {
        Self {
            config: Arc::new(config),
            reader,
            transient: false,
        }
    }

    /// Declared reader name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Declared type tag.
    #[must_use]
    pub fn worker_type(&self) -> &str {
        &self.config.worker_type
    }

    /// Prepared configuration the reader was built from.
    #[must_use]
    pub fn config(&self) -> &PreparedConfig {
        &self.config
    }

    /// The reader itself.
    #[must_use]
    pub fn reader(&self) -> Arc<dyn StreamReader> {
        Arc::clone(&self.reader)
    }

    /// Whether this crate, not static configuration, owns the lifecycle.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        self.transient
    }

    /// Mark the handle as owned by the directory reconciler.
    #[must_use]
    pub fn transient(mut self, transient: bool) -> Self {
        self.transient = transient;
        self
    }
}

impl fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("name", &self.config.name)
            .field("worker_type", &self.config.worker_type)
            .field("transient", &self.transient)
            .finish_non_exhaustive()
    }
}

/// Prepared configuration waiting for its reader.
#[derive(Clone)]
pub struct WorkerMaker {
    config: PreparedConfig,
    factory: Arc<dyn ReaderFactory>,
}

impl WorkerMaker {
    /// Create a maker.
    pub fn new(config: PreparedConfig, factory: Arc<dyn ReaderFactory>) -> Self {
        Self { config, factory }
    }

    /// Override the name the reader will run under.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Name the reader will run under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Declared type tag.
    #[must_use]
    pub fn worker_type(&self) -> &str {
        &self.config.worker_type
    }

    /// Build the reader and wrap it in a handle.
    ///
    /// # Errors
    ///
    /// Returns error if the factory refuses the configuration.
    pub fn make_handle(self) -> logstream_core::Result<WorkerHandle> {
        let reader = self.factory.make_reader(&self.config)?;
        Ok(WorkerHandle::new(self.config, reader))
    }
}

impl fmt::Debug for WorkerMaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerMaker")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
