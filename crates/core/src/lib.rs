//! Core types for directory-managed stream readers.
//!
//! - [`WorkerConfig`]: what one stream reader should do, compared structurally
//! - [`CommonWorkerConfig`]: retry and exit settings as written by the user
//! - [`PreparedConfig`]: a definition with managed defaults resolved
//! - [`Error`] / [`Result`]: typed errors shared by every crate in the workspace

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod config;
pub mod error;
pub mod result;
pub mod retry;

pub use config::{CommonWorkerConfig, PreparedConfig, TranslationMap, WorkerConfig};
pub use error::Error;
pub use result::Result;
pub use retry::RetryOptions;
