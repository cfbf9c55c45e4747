//! Buckets, duplicate groups and run statistics.
//!
//! # Overview
//!
//! Files move through three kinds of containers during a run:
//!
//! - [`SizeGroup`]: files of one exact size. Files of different sizes cannot
//!   be duplicates, so singleton size groups are dropped immediately.
//! - [`HashGroup`]: files of one size sharing a fingerprint. A shared
//!   fingerprint is a pre-filter, never proof of equality.
//! - [`DuplicateGroup`]: a canonical file plus the files confirmed
//!   byte-identical to it.
//!
//! [`DupStat`] accumulates totals while the engine walks and classifies.
//!
//! # Example
//!
//! ```
//! use fdedup::duplicates::SizeGroup;
//! use std::path::PathBuf;
//!
//! let mut group = SizeGroup::new(1024);
//! group.add(PathBuf::from("/file1.txt"));
//! assert!(!group.has_duplicates());
//! group.add(PathBuf::from("/file2.txt"));
//! assert!(group.has_duplicates());
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

/// Bytes per "Mb" in the run summary.
pub const SUMMARY_UNIT: u64 = 0x10_0000;

/// A group of files with the same size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeGroup {
    /// File size in bytes (shared by all files in this group)
    pub size: u64,
    /// Files with this exact size
    pub files: Vec<PathBuf>,
}

impl SizeGroup {
    /// Create an empty size group.
    #[must_use]
    pub fn new(size: u64) -> Self {
        Self {
            size,
            files: Vec::new(),
        }
    }

    /// Add a file to this group.
    pub fn add(&mut self, path: PathBuf) {
        self.files.push(path);
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Check if this group has potential duplicates (2+ files).
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.files.len() > 1
    }
}

/// Files of one size sharing one fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashGroup {
    /// File size in bytes
    pub size: u64,
    /// Shared fingerprint
    pub hash: u64,
    /// Member paths, sorted
    pub files: Vec<PathBuf>,
}

/// Confirmed duplicates of one canonical file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// The file the duplicates get linked to
    pub main_file: PathBuf,
    /// Files byte-identical to `main_file` that do not share its inode
    pub duplicates: Vec<PathBuf>,
    /// Size of every file in the group
    pub size: u64,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    #[must_use]
    pub fn new(main_file: PathBuf, duplicates: Vec<PathBuf>, size: u64) -> Self {
        Self {
            main_file,
            duplicates,
            size,
        }
    }

    /// Number of duplicates (excluding the main file).
    #[must_use]
    pub fn len(&self) -> usize {
        self.duplicates.len()
    }

    /// Check if there are no duplicates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.duplicates.is_empty()
    }

    /// Bytes reclaimed once every duplicate is linked to the main file.
    #[must_use]
    pub fn reclaimable_space(&self) -> u64 {
        self.size * self.duplicates.len() as u64
    }

    /// The main file followed by every duplicate.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.main_file.as_path()).chain(self.duplicates.iter().map(PathBuf::as_path))
    }
}

/// Running totals of a duplicate scan.
///
/// Every enumerated file is counted exactly once as processed or skipped.
/// Duplicates are counted at full size, once per duplicate file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DupStat {
    /// Bytes in files inside the size window
    pub processed_size: u64,
    /// Files inside the size window
    pub processed_amount: u64,
    /// Bytes in files outside the size window
    pub skipped_size: u64,
    /// Files outside the size window
    pub skipped_amount: u64,
    /// Bytes in confirmed duplicates
    pub duplicate_size: u64,
    /// Confirmed duplicates
    pub duplicate_amount: u64,
}

impl DupStat {
    /// Count a file inside the size window.
    pub fn record_processed(&mut self, size: u64) {
        self.processed_amount += 1;
        self.processed_size += size;
    }

    /// Count a file outside the size window.
    pub fn record_skipped(&mut self, size: u64) {
        self.skipped_amount += 1;
        self.skipped_size += size;
    }

    /// Count a confirmed duplicate.
    pub fn record_duplicate(&mut self, size: u64) {
        self.duplicate_amount += 1;
        self.duplicate_size += size;
    }
}

impl fmt::Display for DupStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Processed:  {} files ({} Mb)",
            self.processed_amount,
            self.processed_size / SUMMARY_UNIT
        )?;
        writeln!(
            f,
            "Skipped:    {} files ({} Mb)",
            self.skipped_amount,
            self.skipped_size / SUMMARY_UNIT
        )?;
        write!(
            f,
            "Duplicates: {} files ({} Mb)",
            self.duplicate_amount,
            self.duplicate_size / SUMMARY_UNIT
        )
    }
}
