//! Entries and the two sets they live in.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use logstream_core::{PreparedConfig, WorkerConfig};
use tracing::debug;

use crate::loader::LoadedRecord;
use crate::prepare::ManagedDefaults;
use crate::worker::{ReaderFactory, WorkerHandle, WorkerMaker};

/// A reader handle together with the file that declared it.
#[derive(Debug, Clone)]
pub struct Entry {
    handle: WorkerHandle,
    source: PathBuf,
}

impl Entry {
    /// Pair a handle with its source file.
    pub fn new(handle: WorkerHandle, source: impl Into<PathBuf>) -> Self {
        Self {
            handle,
            source: source.into(),
        }
    }

    /// Reader name; the identity key of the running set.
    #[must_use]
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// File that declared this entry.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    #[must_use]
    pub const fn handle(&self) -> &WorkerHandle {
        &self.handle
    }

    #[must_use]
    pub fn prepared(&self) -> &PreparedConfig {
        self.handle.config()
    }

    #[must_use]
    pub fn config(&self) -> &WorkerConfig {
        &self.handle.config().worker
    }

    /// Whether `other` would run exactly the reader this entry runs.
    #[must_use]
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.prepared().is_equivalent(other.prepared())
    }
}

/// Desired entries from one scan, keyed by file path.
///
/// Rebuilt from scratch every pass. Ordered so passes are deterministic.
pub type SpecifiedSet = BTreeMap<PathBuf, Entry>;

/// Entries whose readers are registered with the host, keyed by reader name.
#[derive(Debug, Default)]
pub struct RunningSet {
    entries: HashMap<String, Entry>,
}

impl RunningSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of the running readers.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub(crate) fn insert(&mut self, entry: Entry) -> Option<Entry> {
        self.entries.insert(entry.name().to_string(), entry)
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Entry> {
        self.entries.remove(name)
    }
}

/// Turns loaded records into transient entries.
#[derive(Clone)]
pub struct EntryFactory {
    defaults: ManagedDefaults,
    factory: Arc<dyn ReaderFactory>,
}

impl EntryFactory {
    /// Create a factory using the managed defaults.
    pub fn new(factory: Arc<dyn ReaderFactory>) -> Self {
        Self {
            defaults: ManagedDefaults::default(),
            factory,
        }
    }

    /// Replace the managed defaults.
    #[must_use]
    pub fn with_defaults(mut self, defaults: ManagedDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Prepare `record`, build its reader and wrap both in an entry.
    ///
    /// # Errors
    ///
    /// Returns error if the reader factory rejects the prepared configuration.
    pub fn build(&self, record: LoadedRecord) -> logstream_core::Result<Entry> {
        let source = record.source.clone();
        let prepared = self.defaults.prepare(record);
        let maker = WorkerMaker::new(prepared, Arc::clone(&self.factory));
        debug!(
            reader = maker.name(),
            worker_type = maker.worker_type(),
            file = %source.display(),
            "Building reader"
        );
        let handle = maker.make_handle()?.transient(true);
        Ok(Entry::new(handle, source))
    }
}
