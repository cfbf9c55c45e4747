//! Content access for duplicate detection.
//!
//! The duplicate engine never touches the filesystem directly. Everything it
//! needs (enumeration, fingerprints, link counts, identity and byte
//! comparison) goes through the [`ContentAccessor`] trait.
//!
//! # Architecture
//!
//! - [`walker`]: [`FilesystemAccessor`], backed by a real directory tree
//! - [`memory`]: [`MemoryAccessor`], a deterministic in-memory fake
//! - [`hasher`]: memory-mapped hashing and byte comparison
//! - [`hardlink`]: inode identity and link counts
//!
//! # Example
//!
//! ```no_run
//! use fdedup::scanner::{ContentAccessor, FilesystemAccessor};
//! use std::path::Path;
//!
//! let accessor = FilesystemAccessor::new(Path::new("."));
//! accessor
//!     .for_each_file(&mut |path, size| println!("{}: {} bytes", path.display(), size))
//!     .unwrap();
//! ```

pub mod hardlink;
pub mod hasher;
pub mod memory;
pub mod walker;

use std::io;
use std::path::{Path, PathBuf};

pub use memory::{MemoryAccessor, MemoryFile};
pub use walker::FilesystemAccessor;

/// A file discovered during enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path as reported by the accessor
    pub path: PathBuf,
    /// File size in bytes at enumeration time
    pub size: u64,
}

impl FileEntry {
    /// Create a new FileEntry.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }
}

/// Capabilities the duplicate engine needs from storage.
///
/// Implementations must be `Sync` so that hashing can be spread over a
/// worker pool; none of the methods take `&mut self`.
pub trait ContentAccessor: Sync {
    /// Invoke `handler` once for every regular file with its size.
    ///
    /// Symbolic links and non-regular files are never reported.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be traversed.
    fn for_each_file(&self, handler: &mut dyn FnMut(&Path, u64)) -> Result<(), AccessError>;

    /// Fingerprint of the complete file contents.
    ///
    /// Equal fingerprints do not imply equal contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    fn content_hash(&self, path: &Path) -> Result<u64, AccessError>;

    /// Number of directory entries referencing the same content (at least 1).
    ///
    /// # Errors
    ///
    /// Returns an error if the file metadata cannot be read.
    fn hard_link_count(&self, path: &Path) -> Result<u64, AccessError>;

    /// Whether both paths already reference the same storage object.
    ///
    /// # Errors
    ///
    /// Returns an error if either file's metadata cannot be read.
    fn is_same_file(&self, first: &Path, second: &Path) -> Result<bool, AccessError>;

    /// Whether both files are byte-for-byte identical over their full length.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be read.
    fn content_equals(&self, first: &Path, second: &Path) -> Result<bool, AccessError>;

    /// Collect the enumeration into a list, in enumeration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be traversed.
    fn files(&self) -> Result<Vec<FileEntry>, AccessError> {
        let mut files = Vec::new();
        self.for_each_file(&mut |path, size| files.push(FileEntry::new(path.to_path_buf(), size)))?;
        Ok(files)
    }
}

/// Errors raised while reading files or walking the tree.
#[derive(thiserror::Error, Debug)]
pub enum AccessError {
    /// The file does not exist (anymore).
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// The path exists but is not a regular file.
    #[error("File is missing or is not a regular file: {0}")]
    NotRegularFile(PathBuf),

    /// The walk root is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Directory traversal failed.
    #[error("Failed to walk {path}: {source}")]
    Walk {
        /// Path where traversal failed
        path: PathBuf,
        /// The underlying walk error
        #[source]
        source: walkdir::Error,
    },
}

impl AccessError {
    /// Classify an I/O error for the given path.
    #[must_use]
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    /// The path this error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::NotRegularFile(p)
            | Self::NotADirectory(p)
            | Self::PermissionDenied(p) => p,
            Self::Io { path, .. } | Self::Walk { path, .. } => path,
        }
    }
}
