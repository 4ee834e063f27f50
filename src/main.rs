//! # logstreamd
//!
//! Process bootstrap for the directory input.
//!
//! ## Startup
//!
//! 1. **Settings** - load the optional settings file, lay CLI flags over it
//! 2. **Host** - create the in-process task host the readers run on
//! 3. **Input** - wire scanner, reconciler and host into a directory input
//! 4. **Loop** - pass on startup, then one pass per tick until Ctrl+C
//!
//! ## Shutdown
//!
//! Ctrl+C stops the loop first, then the host stops every reader it runs.
//! A hard pass error ends the loop the same way and is returned as the exit
//! error.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::expect_used)]

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use logstream_directory::{
    DirectoryInput, DirectorySettings, EntryFactory, LoopConfig, ReconciliationLoop, TaskHost,
};
use logstreamd::DryRunReaderFactory;
use logstreamd::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let settings = load_settings(&cli)?;
    let root = settings.resolved_dir();
    info!(
        root = %root.display(),
        interval_secs = settings.ticker_interval,
        conflict_policy = ?settings.conflict_policy,
        "logstreamd starting"
    );

    let host = Arc::new(TaskHost::new());
    let input = Arc::new(DirectoryInput::with_host(
        &root,
        EntryFactory::new(Arc::new(DryRunReaderFactory)),
        host.clone(),
        settings.reconciler_config(),
    ));

    let outcome = if cli.once {
        run_once(&input).await
    } else {
        run_loop(input, &settings).await
    };

    info!("Cleaning up...");
    host.shutdown().await;
    info!("logstreamd stopped");
    outcome
}

/// Initialize tracing subscriber with environment filter.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_settings(cli: &Cli) -> Result<DirectorySettings> {
    let base = match &cli.config {
        Some(path) => DirectorySettings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => DirectorySettings::default(),
    };
    let settings = cli.apply(base);
    settings.validate().context("Invalid settings")?;
    Ok(settings)
}

async fn run_once(input: &DirectoryInput) -> Result<()> {
    let report = input.run_pass().await.context("Reconciliation pass failed")?;
    let json = serde_json::to_string_pretty(&report).context("Failed to encode pass report")?;
    println!("{json}");
    Ok(())
}

async fn run_loop(input: Arc<DirectoryInput>, settings: &DirectorySettings) -> Result<()> {
    let mut runner = ReconciliationLoop::new(
        input,
        LoopConfig {
            interval: settings.interval(),
        },
    )
    .context("Failed to create reconciliation loop")?;
    let stopper = runner.stopper();

    let mut task = tokio::spawn(async move { runner.run().await });
    info!("logstreamd is running. Press Ctrl+C to stop.");

    tokio::select! {
        joined = &mut task => {
            return joined
                .context("Reconciliation loop panicked")?
                .context("Reconciliation loop failed");
        }
        () = wait_for_shutdown() => stopper.stop(),
    }

    task.await
        .context("Reconciliation loop panicked")?
        .context("Reconciliation loop failed")
}

/// Wait for shutdown signal (Ctrl+C).
async fn wait_for_shutdown() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown"),
        Err(err) => error!("Failed to listen for shutdown signal: {}", err),
    }
}
