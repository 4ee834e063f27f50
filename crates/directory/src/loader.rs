//! Definition file loading.
//!
//! A definition file is TOML holding one or more tables. A table qualifies
//! when its `type` key (or, when absent, its table name) equals the expected
//! reader type. Exactly one table may qualify per file.

use std::path::{Path, PathBuf};

use itertools::Itertools;
use logstream_core::{CommonWorkerConfig, Error, Result, WorkerConfig};
use serde::de::DeserializeOwned;

/// Type tag of the tables this crate manages.
pub const WORKER_TYPE: &str = "LogstreamerInput";

/// A qualifying section decoded into typed configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedRecord {
    /// File the record came from.
    pub source: PathBuf,
    /// Table name; becomes the reader name.
    pub name: String,
    /// Declared type tag.
    pub worker_type: String,
    pub worker: WorkerConfig,
    pub common: CommonWorkerConfig,
}

/// Decodes definition files into [`LoadedRecord`]s.
#[derive(Debug, Clone)]
pub struct RecordLoader {
    expected_type: String,
}

impl Default for RecordLoader {
    fn default() -> Self {
        Self::new(WORKER_TYPE)
    }
}

impl RecordLoader {
    /// Create a loader that picks tables of `expected_type`.
    pub fn new(expected_type: impl Into<String>) -> Self {
        Self {
            expected_type: expected_type.into(),
        }
    }

    /// The type tag this loader matches.
    #[must_use]
    pub fn expected_type(&self) -> &str {
        &self.expected_type
    }

    /// Read and decode the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - the file cannot be read
    /// - the content is not TOML
    /// - no table, or more than one table, has the expected type
    /// - the qualifying table does not decode or validate
    pub fn load(&self, path: &Path) -> Result<LoadedRecord> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::file_read_failed(path, e.to_string()))?;
        self.parse(path, &content)
    }

    /// Decode `content` as if read from `path`.
    ///
    /// # Errors
    ///
    /// Same as [`RecordLoader::load`], minus the read.
    pub fn parse(&self, path: &Path, content: &str) -> Result<LoadedRecord> {
        let sections: toml::Table =
            toml::from_str(content).map_err(|e| Error::toml_parse_failed(path, e.to_string()))?;

        let mut matching = sections
            .into_iter()
            .filter_map(|(name, value)| match value {
                toml::Value::Table(table) => Some((name, table)),
                _ => None,
            })
            .filter(|(name, table)| {
                declared_type(name, table).is_some_and(|kind| kind == self.expected_type)
            })
            .collect_vec();

        let (name, table) = match matching.pop() {
            None => return Err(Error::no_matching_section(path, &self.expected_type)),
            Some(found) if matching.is_empty() => found,
            Some((last, _)) => {
                let sections = matching
                    .into_iter()
                    .map(|(name, _)| name)
                    .chain(std::iter::once(last))
                    .sorted()
                    .collect_vec();
                return Err(Error::ambiguous_section(path, &self.expected_type, sections));
            }
        };

        let worker: WorkerConfig = decode_section(path, &name, &table)?;
        let common: CommonWorkerConfig = decode_section(path, &name, &table)?;

        worker
            .validate()
            .map_err(|e| Error::invalid_section(path, &name, e.to_string()))?;
        if let Some(retries) = &common.retries {
            retries
                .validate()
                .map_err(|e| Error::invalid_section(path, &name, e.to_string()))?;
        }

        Ok(LoadedRecord {
            source: path.to_path_buf(),
            name,
            worker_type: self.expected_type.clone(),
            worker,
            common,
        })
    }
}

/// The `type` key of a table, defaulting to the table name.
///
/// A non-string `type` disqualifies the table.
fn declared_type<'a>(name: &'a str, table: &'a toml::Table) -> Option<&'a str> {
    match table.get("type") {
        None => Some(name),
        Some(toml::Value::String(kind)) => Some(kind.as_str()),
        Some(_) => None,
    }
}

fn decode_section<T: DeserializeOwned>(path: &Path, name: &str, table: &toml::Table) -> Result<T> {
    toml::Value::Table(table.clone())
        .try_into()
        .map_err(|e| Error::invalid_section(path, name, e.to_string()))
}
