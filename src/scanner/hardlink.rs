//! Hard link identity and link counts.
//!
//! # Overview
//!
//! Hard links are multiple directory entries pointing to the same inode on
//! disk. They share content but are not duplicates: they are the same file.
//! The duplicate engine uses the helpers here to skip pairs that are already
//! linked and to prefer the most-referenced file as the canonical copy.
//!
//! # Platform Support
//!
//! - **Unix**: (device_id, inode) pairs and `st_nlink` from file metadata
//! - **Other**: every file counts one link; identity falls back to comparing
//!   canonicalized paths

use std::fs::{self, Metadata};
use std::path::Path;

use super::AccessError;

/// Platform-specific identity of a storage object.
///
/// On Unix, this is (device_id, inode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InodeKey {
    dev: u64,
    ino: u64,
}

impl InodeKey {
    /// Create an inode key from file metadata.
    ///
    /// Returns `None` on platforms without inode information.
    #[cfg(unix)]
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    #[must_use]
    pub fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }
}

/// Number of directory entries referencing the file's inode.
///
/// # Errors
///
/// Returns an error if the metadata cannot be read.
pub fn link_count(path: &Path) -> Result<u64, AccessError> {
    let metadata = fs::metadata(path).map_err(|e| AccessError::from_io(path, e))?;
    Ok(nlink(&metadata))
}

#[cfg(unix)]
fn nlink(metadata: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.nlink().max(1)
}

#[cfg(not(unix))]
fn nlink(_metadata: &Metadata) -> u64 {
    1
}

/// Whether two paths refer to the same storage object.
///
/// # Errors
///
/// Returns an error if either path's metadata cannot be read.
pub fn same_file(first: &Path, second: &Path) -> Result<bool, AccessError> {
    if first == second {
        return Ok(true);
    }

    let first_meta = fs::metadata(first).map_err(|e| AccessError::from_io(first, e))?;
    let second_meta = fs::metadata(second).map_err(|e| AccessError::from_io(second, e))?;

    match (
        InodeKey::from_metadata(&first_meta),
        InodeKey::from_metadata(&second_meta),
    ) {
        (Some(a), Some(b)) => Ok(a == b),
        _ => {
            let a = fs::canonicalize(first).map_err(|e| AccessError::from_io(first, e))?;
            let b = fs::canonicalize(second).map_err(|e| AccessError::from_io(second, e))?;
            Ok(a == b)
        }
    }
}
