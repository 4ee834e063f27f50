//! Shared helpers for the directory integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use logstream_core::PreparedConfig;
use logstream_directory::{
    DirectoryInput, EntryFactory, ReaderFactory, ReconcilerConfig, StreamReader, WorkerHandle,
    WorkerHost,
};
use tokio::sync::{Mutex, watch};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Reader that idles until stopped.
pub struct IdleReader;

#[async_trait]
impl StreamReader for IdleReader {
    async fn run(&self, mut stop: watch::Receiver<bool>) -> logstream_core::Result<()> {
        let _ = stop.wait_for(|stopped| *stopped).await;
        Ok(())
    }
}

pub struct IdleFactory;

impl ReaderFactory for IdleFactory {
    fn make_reader(&self, _config: &PreparedConfig) -> logstream_core::Result<Arc<dyn StreamReader>> {
        Ok(Arc::new(IdleReader))
    }
}

/// Host that counts calls and keeps the configs it was handed.
#[derive(Default)]
pub struct CountingHost {
    adds: AtomicUsize,
    removes: AtomicUsize,
    live: Mutex<Vec<WorkerHandle>>,
    reject: HashSet<String>,
}

impl CountingHost {
    pub fn rejecting(names: &[&str]) -> Self {
        Self {
            reject: names.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    pub fn adds(&self) -> usize {
        self.adds.load(Ordering::SeqCst)
    }

    pub fn removes(&self) -> usize {
        self.removes.load(Ordering::SeqCst)
    }

    /// Sorted names of the live readers.
    pub async fn live_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .live
            .lock()
            .await
            .iter()
            .map(|h| h.name().to_string())
            .collect();
        names.sort();
        names
    }

    pub async fn live_config(&self, name: &str) -> Option<PreparedConfig> {
        self.live
            .lock()
            .await
            .iter()
            .find(|h| h.name() == name)
            .map(|h| h.config().clone())
    }
}

#[async_trait]
impl WorkerHost for CountingHost {
    async fn add_worker(&self, handle: WorkerHandle) -> logstream_directory::Result<()> {
        self.adds.fetch_add(1, Ordering::SeqCst);
        if self.reject.contains(handle.name()) {
            return Err(logstream_directory::Error::worker_rejected(
                handle.name(),
                "rejected by test host",
            ));
        }
        let mut live = self.live.lock().await;
        if live.iter().any(|h| h.name() == handle.name()) {
            return Err(logstream_directory::Error::already_registered(handle.name()));
        }
        live.push(handle);
        Ok(())
    }

    async fn remove_worker(&self, handle: &WorkerHandle) {
        self.removes.fetch_add(1, Ordering::SeqCst);
        self.live.lock().await.retain(|h| h.name() != handle.name());
    }

    async fn is_live(&self, handle: &WorkerHandle) -> bool {
        self.live.lock().await.iter().any(|h| h.name() == handle.name())
    }
}

/// A definition file body for reader `name`.
pub fn definition(name: &str, extra: &str) -> String {
    format!("[{name}]\ntype = \"LogstreamerInput\"\nfile_match = '{name}\\.log'\n{extra}")
}

pub fn write_definition(dir: &Path, file: &str, name: &str, extra: &str) -> std::io::Result<()> {
    let path = dir.join(file);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, definition(name, extra))
}

pub fn input(root: &Path, host: Arc<CountingHost>, config: ReconcilerConfig) -> DirectoryInput {
    DirectoryInput::with_host(root, EntryFactory::new(Arc::new(IdleFactory)), host, config)
}
