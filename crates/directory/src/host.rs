//! In-process worker host: every reader on its own tokio task.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::worker::{WorkerHandle, WorkerHost};

/// How long a reader gets to honour a stop request before it is aborted.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);

struct RunningTask {
    stop_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

/// Runs readers as tokio tasks, restarting them per their retry policy.
pub struct TaskHost {
    tasks: Mutex<HashMap<String, RunningTask>>,
    stop_timeout: Duration,
}

impl TaskHost {
    /// Create a host with the default stop timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_stop_timeout(DEFAULT_STOP_TIMEOUT)
    }

    #[must_use]
    pub fn with_stop_timeout(stop_timeout: Duration) -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            stop_timeout,
        }
    }

    /// Names of the registered readers, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tasks.lock().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered readers, finished ones included.
    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.lock().await.is_empty()
    }

    /// Stop every registered reader.
    pub async fn shutdown(&self) {
        let tasks: Vec<(String, RunningTask)> = self.tasks.lock().await.drain().collect();
        if tasks.is_empty() {
            return;
        }
        info!(readers = tasks.len(), "Shutting down worker host");
        join_all(
            tasks
                .into_iter()
                .map(|(name, task)| self.stop_task(name, task)),
        )
        .await;
    }

    async fn stop_task(&self, name: String, mut task: RunningTask) {
        let _ = task.stop_tx.send(true);
        if tokio::time::timeout(self.stop_timeout, &mut task.join)
            .await
            .is_err()
        {
            warn!(
                reader = %name,
                timeout_ms = self.stop_timeout.as_millis(),
                "Reader ignored stop request, aborting"
            );
            task.join.abort();
        }
    }
}

impl Default for TaskHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkerHost for TaskHost {
    async fn add_worker(&self, handle: WorkerHandle) -> Result<()> {
        let mut tasks = self.tasks.lock().await;
        match tasks.get(handle.name()) {
            Some(task) if !task.join.is_finished() => {
                return Err(Error::already_registered(handle.name()));
            }
            Some(_) => debug!(reader = handle.name(), "Replacing finished reader"),
            None => {}
        }

        let name = handle.name().to_string();
        let (stop_tx, stop_rx) = watch::channel(false);
        debug!(reader = %name, worker_type = handle.worker_type(), "Spawning reader task");
        let join = tokio::spawn(supervise(handle, stop_rx));
        tasks.insert(name, RunningTask { stop_tx, join });
        Ok(())
    }

    async fn remove_worker(&self, handle: &WorkerHandle) {
        let task = self.tasks.lock().await.remove(handle.name());
        match task {
            Some(task) => self.stop_task(handle.name().to_string(), task).await,
            None => debug!(reader = handle.name(), "Reader not registered"),
        }
    }

    async fn is_live(&self, handle: &WorkerHandle) -> bool {
        self.tasks
            .lock()
            .await
            .get(handle.name())
            .is_some_and(|task| !task.join.is_finished())
    }
}

/// Run a reader until it is stopped, finishes for good, or runs out of retries.
async fn supervise(handle: WorkerHandle, mut stop: watch::Receiver<bool>) {
    let reader = handle.reader();
    let config = handle.config();
    let mut attempt: u32 = 0;

    loop {
        let outcome = reader.run(stop.clone()).await;
        if *stop.borrow() {
            debug!(reader = handle.name(), "Reader stopped");
            return;
        }

        match outcome {
            Ok(()) if config.can_exit => {
                info!(reader = handle.name(), "Reader finished");
                return;
            }
            Ok(()) => warn!(reader = handle.name(), "Reader exited unexpectedly"),
            Err(e) => warn!(reader = handle.name(), error = %e, "Reader failed"),
        }

        attempt = attempt.saturating_add(1);
        if !config.retries.allows_attempt(attempt) {
            error!(
                reader = handle.name(),
                retries = attempt.saturating_sub(1),
                "Giving up on reader"
            );
            return;
        }

        let delay = config.retries.delay_for_attempt(attempt);
        debug!(reader = handle.name(), attempt, delay_ms = delay.as_millis(), "Restarting reader");
        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            () = stop_requested(&mut stop) => {
                debug!(reader = handle.name(), "Reader stopped while waiting to restart");
                return;
            }
        }
    }
}

async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    // A dropped sender counts as a stop.
    let _ = stop.wait_for(|stopped| *stopped).await;
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use logstream_core::{PreparedConfig, RetryOptions};

    use super::*;
    use crate::test_support::{IdleReader, prepared};
    use crate::worker::StreamReader;

    /// Fails `failures` times, then behaves like an idle reader.
    struct FlakyReader {
        runs: AtomicU32,
        failures: u32,
    }

    impl FlakyReader {
        fn new(failures: u32) -> Arc<Self> {
            Arc::new(Self {
                runs: AtomicU32::new(0),
                failures,
            })
        }

        fn runs(&self) -> u32 {
            self.runs.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StreamReader for FlakyReader {
        async fn run(&self, stop: watch::Receiver<bool>) -> logstream_core::Result<()> {
            let run = self.runs.fetch_add(1, Ordering::SeqCst);
            if run < self.failures {
                return Err(logstream_core::Error::reader_failed("flaky", "boom"));
            }
            IdleReader.run(stop).await
        }
    }

    /// Returns immediately every time.
    struct QuickReader {
        runs: AtomicU32,
    }

    #[async_trait]
    impl StreamReader for QuickReader {
        async fn run(&self, _stop: watch::Receiver<bool>) -> logstream_core::Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Never looks at its stop channel.
    struct StubbornReader;

    #[async_trait]
    impl StreamReader for StubbornReader {
        async fn run(&self, _stop: watch::Receiver<bool>) -> logstream_core::Result<()> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    fn fast_retries(max_retries: Option<u32>) -> RetryOptions {
        RetryOptions {
            delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            max_retries,
        }
    }

    fn config(name: &str, retries: RetryOptions, can_exit: bool) -> PreparedConfig {
        PreparedConfig {
            retries,
            can_exit,
            ..prepared(name)
        }
    }

    async fn settle() {
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected() -> Result<()> {
        let host = TaskHost::new();
        let handle = WorkerHandle::new(prepared("a"), Arc::new(IdleReader));

        host.add_worker(handle.clone()).await?;
        let second = host.add_worker(handle.clone()).await;

        assert!(matches!(second, Err(Error::AlreadyRegistered { .. })));
        assert_eq!(host.names().await, vec!["a".to_string()]);
        host.remove_worker(&handle).await;
        assert!(host.is_empty().await);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn failed_reader_is_retried() -> Result<()> {
        let host = TaskHost::new();
        let reader = FlakyReader::new(2);
        let handle = WorkerHandle::new(config("a", fast_retries(None), true), reader.clone());

        host.add_worker(handle.clone()).await?;
        settle().await;

        assert_eq!(reader.runs(), 3);
        host.remove_worker(&handle).await;
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn retries_stop_at_the_cap() -> Result<()> {
        let host = TaskHost::new();
        let reader = FlakyReader::new(u32::MAX);
        let handle = WorkerHandle::new(config("a", fast_retries(Some(2)), true), reader.clone());

        host.add_worker(handle.clone()).await?;
        settle().await;

        assert_eq!(reader.runs(), 3);
        host.remove_worker(&handle).await;
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn clean_exit_ends_reader_when_allowed() -> Result<()> {
        let host = TaskHost::new();
        let reader = Arc::new(QuickReader {
            runs: AtomicU32::new(0),
        });
        let handle = WorkerHandle::new(config("a", fast_retries(None), true), reader.clone());

        host.add_worker(handle).await?;
        settle().await;

        assert_eq!(reader.runs.load(Ordering::SeqCst), 1);
        Ok(())
    }

    /// GIVEN: a reader that returned `Ok(())` and was allowed to end
    /// WHEN: its liveness is checked and the same name is added again
    /// THEN: it reports not live, and the re-add starts a fresh run
    #[tokio::test(start_paused = true)]
    async fn finished_reader_is_not_live_and_can_be_added_again() -> Result<()> {
        let host = TaskHost::new();
        let reader = Arc::new(QuickReader {
            runs: AtomicU32::new(0),
        });
        let handle = WorkerHandle::new(config("a", fast_retries(None), true), reader.clone());

        host.add_worker(handle.clone()).await?;
        settle().await;
        assert!(!host.is_live(&handle).await);

        host.add_worker(handle.clone()).await?;
        settle().await;

        assert_eq!(reader.runs.load(Ordering::SeqCst), 2);
        assert_eq!(host.len().await, 1);
        Ok(())
    }

    /// GIVEN: a reader that fails on every run and has a retry cap
    /// WHEN: the cap is reached
    /// THEN: the host no longer reports it live
    #[tokio::test(start_paused = true)]
    async fn reader_out_of_retries_is_not_live() -> Result<()> {
        let host = TaskHost::new();
        let handle = WorkerHandle::new(
            config("a", fast_retries(Some(1)), true),
            FlakyReader::new(u32::MAX),
        );

        host.add_worker(handle.clone()).await?;
        settle().await;

        assert!(!host.is_live(&handle).await);
        Ok(())
    }

    #[tokio::test]
    async fn running_reader_is_live() -> Result<()> {
        let host = TaskHost::new();
        let handle = WorkerHandle::new(prepared("a"), Arc::new(IdleReader));
        let other = WorkerHandle::new(prepared("b"), Arc::new(IdleReader));

        host.add_worker(handle.clone()).await?;

        assert!(host.is_live(&handle).await);
        assert!(!host.is_live(&other).await);
        host.shutdown().await;
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn clean_exit_is_restarted_when_not_allowed() -> Result<()> {
        let host = TaskHost::new();
        let reader = Arc::new(QuickReader {
            runs: AtomicU32::new(0),
        });
        let handle = WorkerHandle::new(config("a", fast_retries(Some(3)), false), reader.clone());

        host.add_worker(handle).await?;
        settle().await;

        assert_eq!(reader.runs.load(Ordering::SeqCst), 4);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn stubborn_reader_is_aborted_after_timeout() -> Result<()> {
        let host = TaskHost::with_stop_timeout(Duration::from_millis(50));
        let handle = WorkerHandle::new(prepared("a"), Arc::new(StubbornReader));

        host.add_worker(handle.clone()).await?;
        host.remove_worker(&handle).await;

        assert!(host.is_empty().await);
        host.add_worker(handle).await?;
        assert_eq!(host.len().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn shutdown_stops_everything() -> Result<()> {
        let host = TaskHost::new();
        for name in ["a", "b", "c"] {
            host.add_worker(WorkerHandle::new(prepared(name), Arc::new(IdleReader)))
                .await?;
        }
        assert_eq!(host.len().await, 3);

        host.shutdown().await;

        assert!(host.is_empty().await);
        Ok(())
    }
}
