//! Doubles shared by the unit tests of this crate.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use logstream_core::{PreparedConfig, RetryOptions, WorkerConfig};
use tokio::sync::{Mutex, watch};

use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::worker::{ReaderFactory, StreamReader, WorkerHandle, WorkerHost};

/// Reader that does nothing until told to stop.
pub struct IdleReader;

#[async_trait]
impl StreamReader for IdleReader {
    async fn run(&self, mut stop: watch::Receiver<bool>) -> logstream_core::Result<()> {
        while !*stop.borrow_and_update() {
            if stop.changed().await.is_err() {
                break;
            }
        }
        Ok(())
    }
}

pub struct IdleFactory;

impl ReaderFactory for IdleFactory {
    fn make_reader(&self, _config: &PreparedConfig) -> logstream_core::Result<Arc<dyn StreamReader>> {
        Ok(Arc::new(IdleReader))
    }
}

pub struct FailingFactory;

impl ReaderFactory for FailingFactory {
    fn make_reader(&self, config: &PreparedConfig) -> logstream_core::Result<Arc<dyn StreamReader>> {
        Err(logstream_core::Error::reader_failed(&config.name, "factory refused"))
    }
}

pub fn prepared(name: &str) -> PreparedConfig {
    PreparedConfig {
        name: name.to_string(),
        worker_type: "LogstreamerInput".to_string(),
        worker: WorkerConfig {
            file_match: format!(r"{name}\.log"),
            ..WorkerConfig::default()
        },
        retries: RetryOptions::default(),
        can_exit: true,
    }
}

pub fn entry_with(config: PreparedConfig, source: &str) -> Entry {
    Entry::new(
        WorkerHandle::new(config, Arc::new(IdleReader)).transient(true),
        PathBuf::from(source),
    )
}

pub fn entry_named(name: &str, source: &str) -> Entry {
    entry_with(prepared(name), source)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Add(String),
    Remove(String),
}

/// Host that records calls and keeps a set of registered names.
#[derive(Default)]
pub struct RecordingHost {
    calls: Mutex<Vec<HostCall>>,
    registered: Mutex<HashSet<String>>,
    reject: HashSet<String>,
}

impl RecordingHost {
    pub fn rejecting(names: &[&str]) -> Self {
        Self {
            reject: names.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    pub async fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().await.clone()
    }

    pub async fn clear(&self) {
        self.calls.lock().await.clear();
    }

    pub async fn registered(&self) -> HashSet<String> {
        self.registered.lock().await.clone()
    }

    /// Mark `name` as having ended on its own.
    pub async fn exit(&self, name: &str) {
        self.registered.lock().await.remove(name);
    }
}

#[async_trait]
impl WorkerHost for RecordingHost {
    async fn add_worker(&self, handle: WorkerHandle) -> Result<()> {
        self.calls
            .lock()
            .await
            .push(HostCall::Add(handle.name().to_string()));
        if self.reject.contains(handle.name()) {
            return Err(Error::worker_rejected(handle.name(), "rejected by test host"));
        }
        if !self.registered.lock().await.insert(handle.name().to_string()) {
            return Err(Error::already_registered(handle.name()));
        }
        Ok(())
    }

    async fn remove_worker(&self, handle: &WorkerHandle) {
        self.calls
            .lock()
            .await
            .push(HostCall::Remove(handle.name().to_string()));
        self.registered.lock().await.remove(handle.name());
    }

    async fn is_live(&self, handle: &WorkerHandle) -> bool {
        self.registered.lock().await.contains(handle.name())
    }
}
