//! Periodic reconciliation loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::input::DirectoryInput;

/// Configuration for the reconciliation loop.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Interval between passes.
    pub interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
        }
    }
}

/// Runs a pass on startup and then on every tick until stopped.
pub struct ReconciliationLoop {
    input: Arc<DirectoryInput>,
    config: LoopConfig,
    stop_rx: watch::Receiver<bool>,
    stop_tx: watch::Sender<bool>,
}

impl ReconciliationLoop {
    /// Create a new reconciliation loop.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSettings` if the interval is zero.
    pub fn new(input: Arc<DirectoryInput>, config: LoopConfig) -> Result<Self> {
        if config.interval.is_zero() {
            return Err(Error::invalid_settings("loop interval must be greater than zero"));
        }
        let (stop_tx, stop_rx) = watch::channel(false);
        Ok(Self {
            input,
            config,
            stop_rx,
            stop_tx,
        })
    }

    /// Run until stopped or a pass fails hard.
    ///
    /// Registered readers are left with the host on return.
    ///
    /// # Errors
    ///
    /// Returns the first fatal pass error.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            root = %self.input.root().display(),
            interval_secs = self.config.interval.as_secs(),
            "Starting reconciliation loop"
        );

        if *self.stop_rx.borrow_and_update() {
            info!("Reconciliation loop stopped");
            return Ok(());
        }

        self.pass().await?;

        let start = Instant::now()
            .checked_add(self.config.interval)
            .unwrap_or_else(Instant::now);
        let mut ticker = tokio::time::interval_at(start, self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.pass().await?,
                changed = self.stop_rx.changed() => {
                    if changed.is_err() || *self.stop_rx.borrow() {
                        info!("Reconciliation loop stopped");
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn pass(&self) -> Result<()> {
        match self.input.run_pass().await {
            Ok(report) => {
                if report.is_noop() {
                    debug!("Converged");
                }
                Ok(())
            }
            Err(e) if !e.is_fatal() => {
                debug!(error = %e, "Tick skipped");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Reconciliation pass failed, stopping loop");
                Err(e)
            }
        }
    }

    /// Stop the loop.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Get a stopper handle.
    #[must_use]
    pub fn stopper(&self) -> LoopStopper {
        LoopStopper {
            stop_tx: self.stop_tx.clone(),
        }
    }
}

/// Handle to stop a reconciliation loop.
#[derive(Clone)]
pub struct LoopStopper {
    stop_tx: watch::Sender<bool>,
}

impl LoopStopper {
    /// Stop the loop.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }
}
