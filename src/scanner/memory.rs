//! Deterministic in-memory content accessor.
//!
//! Every file is described by an explicit `(size, hash, inode, contents)`
//! tuple, so tests can stage hash collisions, pre-existing hard links and
//! size filters without touching a disk. Enumeration runs in path order.
//!
//! ```
//! use fdedup::scanner::{ContentAccessor, MemoryAccessor, MemoryFile};
//! use std::path::Path;
//!
//! let accessor = MemoryAccessor::new([
//!     ("a", MemoryFile::new(10, 0xBEAF, 1, "abc")),
//!     ("b", MemoryFile::new(10, 0xBEAF, 1, "abc")),
//! ]);
//! assert_eq!(accessor.hard_link_count(Path::new("a")).unwrap(), 2);
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{AccessError, ContentAccessor};

/// Description of one simulated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryFile {
    /// Reported size in bytes
    pub size: u64,
    /// Reported fingerprint
    pub hash: u64,
    /// Entries sharing an inode are hard links of each other
    pub inode: u64,
    /// Contents used for byte comparison
    pub contents: Vec<u8>,
}

impl MemoryFile {
    /// Create a simulated file.
    #[must_use]
    pub fn new(size: u64, hash: u64, inode: u64, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            size,
            hash,
            inode,
            contents: contents.into(),
        }
    }
}

/// Content accessor over a fixed map of simulated files.
#[derive(Debug, Clone, Default)]
pub struct MemoryAccessor {
    files: BTreeMap<PathBuf, MemoryFile>,
    links: BTreeMap<u64, u64>,
}

impl MemoryAccessor {
    /// Build an accessor from `(path, file)` pairs.
    #[must_use]
    pub fn new<P, I>(files: I) -> Self
    where
        P: Into<PathBuf>,
        I: IntoIterator<Item = (P, MemoryFile)>,
    {
        let mut accessor = Self::default();
        for (path, file) in files {
            accessor.insert(path, file);
        }
        accessor
    }

    /// Add or replace a file.
    pub fn insert(&mut self, path: impl Into<PathBuf>, file: MemoryFile) {
        *self.links.entry(file.inode).or_insert(0) += 1;
        if let Some(old) = self.files.insert(path.into(), file) {
            if let Some(count) = self.links.get_mut(&old.inode) {
                *count -= 1;
                if *count == 0 {
                    self.links.remove(&old.inode);
                }
            }
        }
    }

    /// Number of simulated files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if there are no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn get(&self, path: &Path) -> Result<&MemoryFile, AccessError> {
        self.files
            .get(path)
            .ok_or_else(|| AccessError::NotFound(path.to_path_buf()))
    }
}

impl ContentAccessor for MemoryAccessor {
    fn for_each_file(&self, handler: &mut dyn FnMut(&Path, u64)) -> Result<(), AccessError> {
        for (path, file) in &self.files {
            handler(path, file.size);
        }
        Ok(())
    }

    fn content_hash(&self, path: &Path) -> Result<u64, AccessError> {
        Ok(self.get(path)?.hash)
    }

    fn hard_link_count(&self, path: &Path) -> Result<u64, AccessError> {
        let inode = self.get(path)?.inode;
        Ok(self.links.get(&inode).copied().unwrap_or(0))
    }

    fn is_same_file(&self, first: &Path, second: &Path) -> Result<bool, AccessError> {
        Ok(self.get(first)?.inode == self.get(second)?.inode)
    }

    fn content_equals(&self, first: &Path, second: &Path) -> Result<bool, AccessError> {
        Ok(self.get(first)?.contents == self.get(second)?.contents)
    }
}
