//! Filesystem-backed content accessor.
//!
//! # Overview
//!
//! [`FilesystemAccessor`] walks a directory tree with [`walkdir`] and
//! answers the engine's content questions from the real filesystem:
//!
//! - Sequential traversal sorted by file name (reproducible enumeration)
//! - Symbolic links are never followed and never reported
//! - Only regular files are reported
//! - Fingerprints and comparisons via [`Hasher`]
//! - Link counts and identity via [`hardlink`](super::hardlink)
//!
//! Any traversal error aborts the enumeration.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::hasher::Hasher;
use super::{hardlink, AccessError, ContentAccessor};

/// Content accessor over a directory tree.
#[derive(Debug, Clone)]
pub struct FilesystemAccessor {
    /// Root path to walk
    root: PathBuf,
    /// Hasher used for fingerprints and comparisons
    hasher: Hasher,
}

impl FilesystemAccessor {
    /// Create an accessor rooted at `root`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use fdedup::scanner::FilesystemAccessor;
    /// use std::path::Path;
    ///
    /// let accessor = FilesystemAccessor::new(Path::new("."));
    /// ```
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            hasher: Hasher::new(),
        }
    }

    /// Replace the hasher (e.g. to tune the mmap threshold).
    #[must_use]
    pub fn with_hasher(mut self, hasher: Hasher) -> Self {
        self.hasher = hasher;
        self
    }
}

impl ContentAccessor for FilesystemAccessor {
    fn for_each_file(&self, handler: &mut dyn FnMut(&Path, u64)) -> Result<(), AccessError> {
        let root_meta =
            std::fs::metadata(&self.root).map_err(|e| AccessError::from_io(&self.root, e))?;
        if !root_meta.is_dir() {
            return Err(AccessError::NotADirectory(self.root.clone()));
        }

        log::debug!("Walking {}", self.root.display());

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| AccessError::Walk {
                path: e.path().map_or_else(|| self.root.clone(), Path::to_path_buf),
                source: e,
            })?;

            // With follow_links(false), symlinks report their own file type.
            if !entry.file_type().is_file() {
                log::trace!("Skipping non-regular entry: {}", entry.path().display());
                continue;
            }

            let metadata = entry.metadata().map_err(|e| AccessError::Walk {
                path: entry.path().to_path_buf(),
                source: e,
            })?;
            handler(entry.path(), metadata.len());
        }

        Ok(())
    }

    fn content_hash(&self, path: &Path) -> Result<u64, AccessError> {
        self.hasher.fingerprint(path)
    }

    fn hard_link_count(&self, path: &Path) -> Result<u64, AccessError> {
        hardlink::link_count(path)
    }

    fn is_same_file(&self, first: &Path, second: &Path) -> Result<bool, AccessError> {
        hardlink::same_file(first, second)
    }

    fn content_equals(&self, first: &Path, second: &Path) -> Result<bool, AccessError> {
        self.hasher.compare(first, second)
    }
}
