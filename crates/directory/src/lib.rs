//! Directory-driven reconciliation of stream readers.
//!
//! Reader definitions live as TOML files in a directory tree. On startup and
//! then on a fixed interval the tree is scanned and the running readers are
//! brought in line with what the files say:
//!
//! - **Specified set**: one entry per definition file, rebuilt every scan
//! - **Running set**: readers this crate registered with the host, by name
//! - **Reconcile**: stop removed readers, restart changed ones, start new ones
//! - **Conflicts**: a second file claiming a running name is refused
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use logstream_directory::{
//!     DirectoryInput, EntryFactory, LoopConfig, ReconcilerConfig, ReconciliationLoop, TaskHost,
//! };
//!
//! #[tokio::main]
//! async fn main() -> logstream_directory::Result<()> {
//!     let host = Arc::new(TaskHost::new());
//!     let input = Arc::new(DirectoryInput::with_host(
//!         "logstreamers.d",
//!         EntryFactory::new(Arc::new(MyReaderFactory)),
//!         host.clone(),
//!         ReconcilerConfig::default(),
//!     ));
//!
//!     let mut runner = ReconciliationLoop::new(input, LoopConfig::default())?;
//!     runner.run().await?;
//!     host.shutdown().await;
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod entry;
pub mod error;
pub mod host;
pub mod input;
pub mod loader;
pub mod r#loop;
pub mod prepare;
pub mod reconciler;
pub mod scanner;
pub mod settings;
pub mod types;
pub mod worker;

#[cfg(test)]
mod test_support;

// Re-export main types
pub use entry::{Entry, EntryFactory, RunningSet, SpecifiedSet};
pub use error::{Error, Result};
pub use host::TaskHost;
pub use input::DirectoryInput;
pub use loader::{LoadedRecord, RecordLoader, WORKER_TYPE};
pub use r#loop::{LoopConfig, LoopStopper, ReconciliationLoop};
pub use prepare::ManagedDefaults;
pub use reconciler::{ConflictPolicy, Reconciler, ReconcilerBuilder, ReconcilerConfig};
pub use scanner::DirectoryScanner;
pub use settings::DirectorySettings;
pub use types::{PassReport, ReconcileAction, ScanDiagnostic, ScanOutcome, StopReason};
pub use worker::{ReaderFactory, StreamReader, WorkerHandle, WorkerHost, WorkerMaker};
