#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # logstreamd
//!
//! Keeps a set of stream readers in sync with a directory of TOML definitions.
//!
//! This library re-exports the workspace crates for convenience.

pub use logstream_core;
pub use logstream_directory;

pub mod cli;
pub mod reader;

pub use reader::{DryRunReader, DryRunReaderFactory};
