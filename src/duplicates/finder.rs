//! Duplicate finder implementation with cascading classification.
//!
//! # Overview
//!
//! This module turns an enumeration of `(path, size)` pairs into groups of
//! confirmed duplicates:
//! 1. **Enumerate**: files inside `[min_size, max_size]` are processed and
//!    grouped by size, everything else is skipped
//! 2. **Size grouping**: only sizes shared by 2+ files go further
//! 3. **Hash grouping**: same-size files are fingerprinted once and grouped
//!    by fingerprint; singleton fingerprints are dropped
//! 4. **Classification**: inside a hash group the file with the most hard
//!    links becomes canonical, the rest are already linked, confirmed
//!    duplicates, or mismatched. Mismatched files (fingerprint collisions)
//!    go back on a worklist and are classified again among themselves.
//!
//! Canonical ties on link count go to the lexicographically smallest path.
//! Output order is deterministic: ascending size, then ascending fingerprint.
//!
//! Any [`AccessError`] aborts the whole run; no partial results are returned.
//!
//! # Example
//!
//! ```
//! use fdedup::duplicates::find_duplicates;
//! use fdedup::scanner::{MemoryAccessor, MemoryFile};
//!
//! let fs = MemoryAccessor::new([
//!     ("a", MemoryFile::new(10, 0xBEAF, 1, "abc")),
//!     ("b", MemoryFile::new(10, 0xBEAF, 2, "abc")),
//!     ("c", MemoryFile::new(20, 0xDEAD, 3, "DEF")),
//! ]);
//!
//! let (groups, stat) = find_duplicates(&fs, 1, 100).unwrap();
//! assert_eq!(groups.len(), 1);
//! assert_eq!(stat.duplicate_amount, 1);
//! assert_eq!(stat.duplicate_size, 10);
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use super::groups::{DupStat, DuplicateGroup, HashGroup, SizeGroup};
use crate::progress::{ProgressCallback, PHASE_COMPARE, PHASE_ENUMERATE, PHASE_HASH};
use crate::scanner::{AccessError, ContentAccessor};

/// Default minimum file size (4 KiB).
pub const DEFAULT_MIN_SIZE: u64 = 0x1000;
/// Default maximum file size (1 GiB).
pub const DEFAULT_MAX_SIZE: u64 = 0x4000_0000;

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Smallest file size considered (inclusive).
    pub min_size: u64,
    /// Largest file size considered (inclusive).
    pub max_size: u64,
    /// Number of threads fingerprinting size groups. 1 means sequential.
    pub io_threads: usize,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("min_size", &self.min_size)
            .field("max_size", &self.max_size)
            .field("io_threads", &self.io_threads)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_SIZE,
            max_size: DEFAULT_MAX_SIZE,
            io_threads: 1,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the inclusive size window.
    #[must_use]
    pub fn with_size_range(mut self, min_size: u64, max_size: u64) -> Self {
        self.min_size = min_size;
        self.max_size = max_size;
        self
    }

    /// Set the number of fingerprinting threads.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn in_range(&self, size: u64) -> bool {
        size >= self.min_size && size <= self.max_size
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The size window is empty.
    #[error("Invalid size range: minimum {min} is greater than maximum {max}")]
    InvalidSizeRange {
        /// Configured minimum
        min: u64,
        /// Configured maximum
        max: u64,
    },

    /// A file could not be enumerated, read or compared.
    #[error(transparent)]
    Access(#[from] AccessError),
}

/// Duplicate finder that runs the cascading detection pipeline.
///
/// # Example
///
/// ```no_run
/// use fdedup::duplicates::{DuplicateFinder, FinderConfig};
/// use fdedup::scanner::FilesystemAccessor;
/// use std::path::Path;
///
/// let finder = DuplicateFinder::new(FinderConfig::default().with_size_range(1, u64::MAX));
/// let accessor = FilesystemAccessor::new(Path::new("."));
/// let (groups, stat) = finder.find_duplicates(&accessor).unwrap();
///
/// println!("Found {} duplicate groups", groups.len());
/// println!("{}", stat);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Find all duplicate files reported by `accessor`.
    ///
    /// # Returns
    ///
    /// A tuple of:
    /// - `Vec<DuplicateGroup>` - Confirmed duplicate groups
    /// - `DupStat` - Processed, skipped and duplicate totals
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - `min_size` is greater than `max_size` (checked before enumeration)
    /// - any file cannot be enumerated, fingerprinted or compared
    pub fn find_duplicates<A>(
        &self,
        accessor: &A,
    ) -> Result<(Vec<DuplicateGroup>, DupStat), FinderError>
    where
        A: ContentAccessor + ?Sized,
    {
        if self.config.min_size > self.config.max_size {
            return Err(FinderError::InvalidSizeRange {
                min: self.config.min_size,
                max: self.config.max_size,
            });
        }

        let mut stat = DupStat::default();

        // Phase 1: enumerate and group by size
        let size_groups = self.group_by_size(accessor, &mut stat)?;
        let candidates: Vec<SizeGroup> = size_groups
            .into_values()
            .filter(SizeGroup::has_duplicates)
            .collect();

        log::debug!(
            "Size grouping: {} of {} processed files share a size ({} groups)",
            candidates.iter().map(SizeGroup::len).sum::<usize>(),
            stat.processed_amount,
            candidates.len()
        );

        // Phase 2: fingerprint same-size files
        let hash_groups = self.group_by_hash(accessor, candidates)?;

        log::debug!(
            "Hash grouping: {} groups with shared fingerprints",
            hash_groups.len()
        );

        // Phase 3: canonical selection and byte comparison
        let mut duplicates = Vec::new();
        self.notify_start(PHASE_COMPARE, hash_groups.len());
        for (idx, group) in hash_groups.into_iter().enumerate() {
            if let Some(ref callback) = self.config.progress_callback {
                if let Some(first) = group.files.first() {
                    callback.on_progress(idx + 1, first.to_string_lossy().as_ref());
                }
            }
            classify(accessor, group, &mut duplicates, &mut stat)?;
        }
        self.notify_end(PHASE_COMPARE);

        log::info!(
            "Found {} duplicates in {} groups",
            stat.duplicate_amount,
            duplicates.len()
        );

        Ok((duplicates, stat))
    }

    /// Enumerate files, update the processed/skipped totals and bucket
    /// in-range files by size.
    fn group_by_size<A>(
        &self,
        accessor: &A,
        stat: &mut DupStat,
    ) -> Result<BTreeMap<u64, SizeGroup>, AccessError>
    where
        A: ContentAccessor + ?Sized,
    {
        let mut groups: BTreeMap<u64, SizeGroup> = BTreeMap::new();
        let callback = self.config.progress_callback.as_deref();
        let mut seen = 0usize;

        self.notify_start(PHASE_ENUMERATE, 0);
        accessor.for_each_file(&mut |path, size| {
            seen += 1;
            if let Some(callback) = callback {
                callback.on_progress(seen, path.to_string_lossy().as_ref());
            }

            if self.config.in_range(size) {
                stat.record_processed(size);
                groups
                    .entry(size)
                    .or_insert_with(|| SizeGroup::new(size))
                    .add(path.to_path_buf());
            } else {
                log::trace!("Skipping {} ({} bytes)", path.display(), size);
                stat.record_skipped(size);
            }
        })?;
        self.notify_end(PHASE_ENUMERATE);

        Ok(groups)
    }

    /// Fingerprint every candidate and keep fingerprints shared by 2+ files.
    ///
    /// Size groups are independent, so they may be spread over a thread pool.
    fn group_by_hash<A>(
        &self,
        accessor: &A,
        size_groups: Vec<SizeGroup>,
    ) -> Result<Vec<HashGroup>, AccessError>
    where
        A: ContentAccessor + ?Sized,
    {
        let total: usize = size_groups.iter().map(SizeGroup::len).sum();
        let hashed = AtomicUsize::new(0);
        let callback = self.config.progress_callback.as_deref();
        let bucket = |group: SizeGroup| bucket_by_hash(accessor, group, &hashed, callback);

        self.notify_start(PHASE_HASH, total);

        let pool = if self.config.io_threads > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.io_threads)
                .build()
            {
                Ok(pool) => Some(pool),
                Err(e) => {
                    log::warn!("Failed to create hashing thread pool, hashing sequentially: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let nested: Vec<Vec<HashGroup>> = match pool {
            Some(pool) => pool.install(|| {
                size_groups
                    .into_par_iter()
                    .map(bucket)
                    .collect::<Result<_, _>>()
            })?,
            None => size_groups
                .into_iter()
                .map(bucket)
                .collect::<Result<_, _>>()?,
        };

        self.notify_end(PHASE_HASH);

        Ok(nested.into_iter().flatten().collect())
    }

    fn notify_start(&self, phase: &str, total: usize) {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(phase, total);
        }
    }

    fn notify_end(&self, phase: &str) {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(phase);
        }
    }
}

/// Find duplicates with the default configuration and the given size window.
///
/// # Errors
///
/// See [`DuplicateFinder::find_duplicates`].
pub fn find_duplicates<A>(
    accessor: &A,
    min_size: u64,
    max_size: u64,
) -> Result<(Vec<DuplicateGroup>, DupStat), FinderError>
where
    A: ContentAccessor + ?Sized,
{
    DuplicateFinder::new(FinderConfig::default().with_size_range(min_size, max_size))
        .find_duplicates(accessor)
}

/// Split one size group by fingerprint, dropping singleton fingerprints.
fn bucket_by_hash<A>(
    accessor: &A,
    group: SizeGroup,
    hashed: &AtomicUsize,
    callback: Option<&dyn ProgressCallback>,
) -> Result<Vec<HashGroup>, AccessError>
where
    A: ContentAccessor + ?Sized,
{
    let size = group.size;
    let mut by_hash: BTreeMap<u64, Vec<PathBuf>> = BTreeMap::new();

    for path in group.files {
        let hash = accessor.content_hash(&path)?;
        let current = hashed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(callback) = callback {
            callback.on_progress(current, path.to_string_lossy().as_ref());
        }
        by_hash.entry(hash).or_default().push(path);
    }

    Ok(by_hash
        .into_iter()
        .filter_map(|(hash, mut files)| {
            if files.len() < 2 {
                log::trace!("Unique fingerprint {:016x}: {}", hash, files[0].display());
                return None;
            }
            files.sort();
            Some(HashGroup { size, hash, files })
        })
        .collect())
}

/// Classify one hash group, appending every duplicate group it contains.
///
/// Mismatched files are put back on a worklist instead of recursing, so a
/// long chain of fingerprint collisions cannot exhaust the stack. Each pass
/// removes the canonical file and everything matched to it, so the working
/// set strictly shrinks.
///
/// Link counts do not change during detection, so they are read once per
/// member and carried through the worklist.
fn classify<A>(
    accessor: &A,
    group: HashGroup,
    duplicates: &mut Vec<DuplicateGroup>,
    stat: &mut DupStat,
) -> Result<(), AccessError>
where
    A: ContentAccessor + ?Sized,
{
    let size = group.size;
    let members = group
        .files
        .into_iter()
        .map(|path| {
            let links = accessor.hard_link_count(&path)?;
            Ok((path, links))
        })
        .collect::<Result<Vec<_>, AccessError>>()?;
    let mut worklist = vec![members];

    while let Some(mut candidates) = worklist.pop() {
        debug_assert!(candidates.len() > 1);

        let canonical = select_canonical(&candidates);
        let (main_file, _) = candidates.remove(canonical);

        let mut found = Vec::new();
        let mut mismatched = Vec::new();
        for (path, links) in candidates {
            if accessor.is_same_file(&path, &main_file)? {
                log::trace!(
                    "Already linked: {} == {}",
                    path.display(),
                    main_file.display()
                );
            } else if accessor.content_equals(&path, &main_file)? {
                stat.record_duplicate(size);
                found.push(path);
            } else {
                log::trace!(
                    "Fingerprint collision: {} != {}",
                    path.display(),
                    main_file.display()
                );
                mismatched.push((path, links));
            }
        }

        if !found.is_empty() {
            log::debug!(
                "Found {} duplicates of {}",
                found.len(),
                main_file.display()
            );
            duplicates.push(DuplicateGroup::new(main_file, found, size));
        }

        if mismatched.len() > 1 {
            worklist.push(mismatched);
        }
    }

    Ok(())
}

/// Index of the member with the most hard links.
///
/// `candidates` is sorted by path, so keeping the first strict maximum
/// breaks ties towards the smallest path.
fn select_canonical(candidates: &[(PathBuf, u64)]) -> usize {
    let mut best = 0;
    let mut max_links = 0;
    for (idx, (_, links)) in candidates.iter().enumerate() {
        if *links > max_links {
            max_links = *links;
            best = idx;
        }
    }
    best
}
