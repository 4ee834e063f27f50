//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use logstream_directory::{ConflictPolicy, DirectorySettings};

/// logstreamd - keep stream readers in sync with a definition directory
#[derive(Parser, Debug)]
#[command(name = "logstreamd")]
#[command(version)]
#[command(about = "Keeps a set of stream readers in sync with a directory of TOML definitions")]
pub struct Cli {
    /// Settings file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Definition directory, overrides `logstreamer_dir`
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Seconds between passes, overrides `ticker_interval`
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Base for a relative definition directory
    #[arg(long)]
    pub share_dir: Option<PathBuf>,

    /// What to do when two files claim one reader name
    #[arg(long, value_enum)]
    pub conflict_policy: Option<PolicyArg>,

    /// Run a single pass, print the report as JSON and exit
    #[arg(long, default_value_t = false)]
    pub once: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyArg {
    AbortPass,
    RejectFile,
}

impl From<PolicyArg> for ConflictPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::AbortPass => Self::AbortPass,
            PolicyArg::RejectFile => Self::RejectFile,
        }
    }
}

impl Cli {
    /// Lay the flags over `settings`.
    #[must_use]
    pub fn apply(&self, mut settings: DirectorySettings) -> DirectorySettings {
        if let Some(dir) = &self.dir {
            settings.logstreamer_dir.clone_from(dir);
        }
        if let Some(interval) = self.interval {
            settings.ticker_interval = interval;
        }
        if let Some(share_dir) = &self.share_dir {
            settings.share_dir = Some(share_dir.clone());
        }
        if let Some(policy) = self.conflict_policy {
            settings.conflict_policy = policy.into();
        }
        settings
    }
}
