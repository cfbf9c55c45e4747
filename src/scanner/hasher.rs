//! File fingerprinting and byte comparison.
//!
//! # Overview
//! [`Hasher`] computes a 64-bit fingerprint of a file's full contents
//! (the leading bytes of its BLAKE3 digest) and compares two files byte by
//! byte. Large files are memory-mapped, small ones are read into memory.
//! Empty files are never mapped; they hash and compare as empty input.

use std::fs::{self, File};
use std::path::Path;

use memmap2::Mmap;

use super::AccessError;

/// Files at or above this size are memory-mapped by default.
pub const DEFAULT_MMAP_THRESHOLD: u64 = 64 * 1024;

/// Fingerprints and compares file contents.
#[derive(Debug, Clone)]
pub struct Hasher {
    mmap_threshold: u64,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default mapping threshold.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mmap_threshold: DEFAULT_MMAP_THRESHOLD,
        }
    }

    /// Set the size from which files are memory-mapped instead of read.
    #[must_use]
    pub fn with_mmap_threshold(mut self, threshold: u64) -> Self {
        self.mmap_threshold = threshold;
        self
    }

    /// Compute the 64-bit fingerprint of the whole file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, not a regular file or
    /// cannot be read.
    pub fn fingerprint(&self, path: &Path) -> Result<u64, AccessError> {
        let len = regular_file_len(path)?;
        let digest = if len >= self.mmap_threshold && len > 0 {
            let mut hasher = blake3::Hasher::new();
            hasher
                .update_mmap(path)
                .map_err(|e| AccessError::from_io(path, e))?;
            hasher.finalize()
        } else {
            self.with_contents(path, len, |data| blake3::hash(data))?
        };
        Ok(fingerprint_of(&digest))
    }

    /// Compare two files over their full length.
    ///
    /// # Errors
    ///
    /// Returns an error if either file is missing, not a regular file or
    /// cannot be read.
    pub fn compare(&self, first: &Path, second: &Path) -> Result<bool, AccessError> {
        let first_len = regular_file_len(first)?;
        let second_len = regular_file_len(second)?;
        if first_len != second_len {
            return Ok(false);
        }

        self.with_contents(first, first_len, |a| {
            self.with_contents(second, second_len, |b| a == b)
        })?
    }

    /// Run `f` over the file contents, mapped or read depending on size.
    fn with_contents<T>(
        &self,
        path: &Path,
        len: u64,
        f: impl FnOnce(&[u8]) -> T,
    ) -> Result<T, AccessError> {
        if len == 0 {
            return Ok(f(&[]));
        }

        if len < self.mmap_threshold {
            let data = fs::read(path).map_err(|e| AccessError::from_io(path, e))?;
            return Ok(f(&data));
        }

        let file = File::open(path).map_err(|e| AccessError::from_io(path, e))?;
        // SAFETY: the mapping is read-only and dropped before returning. A
        // concurrent writer can change the bytes we see, which at worst makes
        // the comparison report a mismatch.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| AccessError::from_io(path, e))?;
        #[cfg(unix)]
        if let Err(e) = mmap.advise(memmap2::Advice::Sequential) {
            log::trace!("madvise failed for {}: {}", path.display(), e);
        }
        Ok(f(&mmap))
    }
}

/// Size of `path`, failing unless it is a regular file.
fn regular_file_len(path: &Path) -> Result<u64, AccessError> {
    let metadata = fs::metadata(path).map_err(|e| AccessError::from_io(path, e))?;
    if !metadata.is_file() {
        return Err(AccessError::NotRegularFile(path.to_path_buf()));
    }
    Ok(metadata.len())
}

fn fingerprint_of(digest: &blake3::Hash) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}
