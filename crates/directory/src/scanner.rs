//! Directory scanning: definition tree -> specified set.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::entry::{Entry, EntryFactory};
use crate::error::{Error, Result};
use crate::loader::RecordLoader;
use crate::types::{ScanDiagnostic, ScanOutcome};

/// Extension a file must carry to be loaded.
pub const CONFIG_EXTENSION: &str = "toml";

/// Walks a definition tree and builds the specified set.
#[derive(Clone)]
pub struct DirectoryScanner {
    root: PathBuf,
    loader: RecordLoader,
    entries: EntryFactory,
}

impl DirectoryScanner {
    /// Create a scanner rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, entries: EntryFactory) -> Self {
        Self {
            root: root.into(),
            loader: RecordLoader::default(),
            entries,
        }
    }

    /// Use a loader matching a different type tag.
    #[must_use]
    pub fn with_loader(mut self, loader: RecordLoader) -> Self {
        self.loader = loader;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the tree once.
    ///
    /// Directories and files without the `.toml` extension are skipped
    /// silently. Files that fail to load, and nodes that cannot be visited,
    /// are skipped with a diagnostic.
    ///
    /// # Errors
    ///
    /// Returns `WalkFailed` if the root itself cannot be visited or listed.
    pub fn scan(&self) -> Result<ScanOutcome> {
        let mut outcome = ScanOutcome::default();
        debug!(
            root = %self.root.display(),
            worker_type = self.loader.expected_type(),
            "Scanning definition tree"
        );

        for item in WalkDir::new(&self.root).sort_by_file_name() {
            let dirent = match item {
                Ok(dirent) => dirent,
                Err(e) if e.depth() == 0 => {
                    return Err(Error::walk_failed(&self.root, e.to_string()));
                }
                Err(e) => {
                    let path = e.path().map_or_else(|| self.root.clone(), Path::to_path_buf);
                    warn!(path = %path.display(), error = %e, "Skipping unreadable path");
                    outcome
                        .diagnostics
                        .push(ScanDiagnostic::new(path, format!("walking: {e}")));
                    continue;
                }
            };

            let path = dirent.path();
            if dirent.file_type().is_dir() || !has_config_extension(path) {
                continue;
            }

            match self.load_entry(path) {
                Ok(entry) => {
                    debug!(path = %path.display(), reader = entry.name(), "Loaded definition");
                    outcome.specified.insert(path.to_path_buf(), entry);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping definition file");
                    outcome
                        .diagnostics
                        .push(ScanDiagnostic::new(path, format!("loading definition: {e}")));
                }
            }
        }

        Ok(outcome)
    }

    fn load_entry(&self, path: &Path) -> logstream_core::Result<Entry> {
        let record = self.loader.load(path)?;
        self.entries.build(record)
    }
}

fn has_config_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == CONFIG_EXTENSION)
}
