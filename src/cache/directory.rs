//! Dedupes parent-directory existence/creation checks across a batch.
//!
//! Without this, every document in a batch destined for the same output
//! directory would stat (and potentially `create_dir_all`) that directory
//! independently. [`DirectoryCache`] remembers which paths have already been
//! confirmed usable for the lifetime of one batch.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{RenderError, Result};

/// A lock-protected set of directories already confirmed to exist.
///
/// Scoped to a single batch — construct one per
/// [`BatchScheduler::documents`](crate::schedule::BatchScheduler::documents)
/// call and let it drop (or call [`clear`](Self::clear)) when the batch ends.
#[derive(Default)]
pub struct DirectoryCache {
    known: Mutex<HashSet<PathBuf>>,
}

impl DirectoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Confirm that `path` exists and is a directory, creating it (and its
    /// ancestors) first if `create_if_needed` is set.
    ///
    /// Subsequent calls with the same path are a cheap set-membership check.
    pub fn ensure(&self, path: &Path, create_if_needed: bool) -> Result<()> {
        {
            let known = self.known.lock().unwrap();
            if known.contains(path) {
                return Ok(());
            }
        }

        if create_if_needed {
            std::fs::create_dir_all(path).map_err(RenderError::DirectoryCreationFailed)?;
        } else if !path.is_dir() {
            return Err(RenderError::InvalidFilePath(format!(
                "destination directory does not exist: {}",
                path.display()
            )));
        }

        self.known.lock().unwrap().insert(path.to_path_buf());
        Ok(())
    }

    /// Forget every confirmed directory. Call this at batch termination.
    pub fn clear(&self) {
        self.known.lock().unwrap().clear();
    }

    /// Number of distinct directories currently confirmed.
    pub fn len(&self) -> usize {
        self.known.lock().unwrap().len()
    }

    /// Whether no directories have been confirmed yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
