//! Crash-safe replacement of duplicates with hard links.
//!
//! # Overview
//!
//! Each duplicate is replaced by a hard link to its group's main file
//! through a small state machine ([`LinkState`]):
//!
//! ```text
//! Pending --link dup->backup, unlink dup--> BackedUp --link main->dup--> Linked --remove backup--> Cleaned
//!                                              |
//!                                              +--link failed, rename backup->dup--> RolledBack
//! ```
//!
//! At every point the duplicate's content exists either under its own path
//! or under the backup path next to it, so an interrupted run can always be
//! recovered by hand.
//!
//! # Failure handling
//!
//! - Backup path already taken: the duplicate is skipped and reported as a
//!   conflict; the run continues. The backup is created with a hard link,
//!   which never replaces an existing entry, so a file appearing there after
//!   the check is still a conflict rather than being overwritten.
//! - Link failure: the backup is renamed back and the run stops. Groups
//!   merged before the failure stay merged.
//! - Any other filesystem failure stops the run.
//!
//! # Example
//!
//! ```no_run
//! use fdedup::actions::merge::merge_groups;
//! use fdedup::duplicates::DuplicateGroup;
//! use std::path::PathBuf;
//!
//! let groups = vec![DuplicateGroup::new(
//!     PathBuf::from("/data/a.bin"),
//!     vec![PathBuf::from("/data/copy-of-a.bin")],
//!     4096,
//! )];
//! let summary = merge_groups(&groups, &mut std::io::stdout(), &mut std::io::stderr()).unwrap();
//! println!("Merged {} files", summary.merged);
//! ```

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::duplicates::DuplicateGroup;

/// Suffix appended to a duplicate's file name while it is being replaced.
pub const BACKUP_SUFFIX: &str = ".fdup-bak";

/// Error type for merge operations.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Moving the duplicate aside failed; nothing was changed.
    #[error("failed to move {duplicate} to {backup}: {source}")]
    Backup {
        duplicate: PathBuf,
        backup: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Linking failed; the duplicate was restored from its backup.
    #[error("failed to link {canonical} to {duplicate}: {source}")]
    Link {
        canonical: PathBuf,
        duplicate: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Linking failed and the duplicate could not be restored.
    #[error(
        "failed to link {canonical} to {duplicate}: {source}; \
         restoring it from {backup} also failed: {rollback}"
    )]
    RollbackFailed {
        canonical: PathBuf,
        duplicate: PathBuf,
        backup: PathBuf,
        #[source]
        source: io::Error,
        rollback: io::Error,
    },

    /// The duplicate was linked but its backup could not be removed.
    #[error("linked {duplicate} but failed to remove backup {backup}: {source}")]
    Cleanup {
        duplicate: PathBuf,
        backup: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing a status line failed.
    #[error("failed to write merge status: {0}")]
    Output(#[from] io::Error),
}

impl MergeError {
    /// The duplicate path this error concerns (if any).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Backup { duplicate, .. }
            | Self::Link { duplicate, .. }
            | Self::RollbackFailed { duplicate, .. }
            | Self::Cleanup { duplicate, .. } => Some(duplicate),
            Self::Output(_) => None,
        }
    }
}

/// Progress of a single duplicate through the merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Nothing touched yet.
    Pending,
    /// Duplicate moved to its backup path.
    BackedUp,
    /// Duplicate path now links to the main file; backup still present.
    Linked,
    /// Backup removed. Terminal.
    Cleaned,
    /// Link failed and the backup was renamed back. Terminal.
    RolledBack,
}

/// Result of merging one duplicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The duplicate now shares the main file's content.
    Linked,
    /// Something already occupies the backup path; the duplicate was skipped.
    Conflict {
        /// The occupied backup path
        backup: PathBuf,
    },
}

/// Totals of a merge run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Duplicates replaced by hard links
    pub merged: u64,
    /// Bytes no longer stored separately
    pub merged_size: u64,
    /// Duplicates skipped because their backup path was taken
    pub conflicts: Vec<PathBuf>,
}

impl MergeSummary {
    /// Check if any duplicate was skipped.
    #[must_use]
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// Backup location for a duplicate: same directory, reserved suffix.
///
/// ```
/// use fdedup::actions::merge::backup_path;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(
///     backup_path(Path::new("/data/photo.jpg")),
///     PathBuf::from("/data/photo.jpg.fdup-bak")
/// );
/// ```
#[must_use]
pub fn backup_path(duplicate: &Path) -> PathBuf {
    let mut name = duplicate
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(BACKUP_SUFFIX);
    duplicate.with_file_name(name)
}

/// Replacement of one duplicate by a hard link to its main file.
#[derive(Debug)]
pub struct LinkTransaction<'a> {
    canonical: &'a Path,
    duplicate: &'a Path,
    backup: PathBuf,
    state: LinkState,
}

impl<'a> LinkTransaction<'a> {
    /// Prepare replacing `duplicate` with a link to `canonical`.
    #[must_use]
    pub fn new(canonical: &'a Path, duplicate: &'a Path) -> Self {
        Self {
            canonical,
            duplicate,
            backup: backup_path(duplicate),
            state: LinkState::Pending,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Where the duplicate is parked while being replaced.
    #[must_use]
    pub fn backup(&self) -> &Path {
        &self.backup
    }

    /// Whether the backup path is already occupied by something.
    ///
    /// Dangling symlinks count as occupied.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup path cannot be inspected.
    pub fn backup_taken(&self) -> Result<bool, MergeError> {
        match fs::symlink_metadata(&self.backup) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.backup_error(e)),
        }
    }

    /// `Pending -> BackedUp`: move the duplicate to its backup path.
    ///
    /// The backup is a hard link to the duplicate, so an entry already at the
    /// backup path is never replaced. Returns `false` and stays `Pending` when
    /// the backup path turns out to be taken.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup cannot be created or the duplicate
    /// cannot be unlinked; the state stays `Pending` and nothing is changed.
    pub fn back_up(&mut self) -> Result<bool, MergeError> {
        debug_assert_eq!(self.state, LinkState::Pending);
        match fs::hard_link(self.duplicate, &self.backup) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(self.backup_error(e)),
        }
        if let Err(e) = fs::remove_file(self.duplicate) {
            // Drop the extra name again; the duplicate is still in place
            let _ = fs::remove_file(&self.backup);
            return Err(self.backup_error(e));
        }
        self.state = LinkState::BackedUp;
        log::debug!(
            "Backed up {} as {}",
            self.duplicate.display(),
            self.backup.display()
        );
        Ok(true)
    }

    fn backup_error(&self, source: io::Error) -> MergeError {
        MergeError::Backup {
            duplicate: self.duplicate.to_path_buf(),
            backup: self.backup.clone(),
            source,
        }
    }

    /// `BackedUp -> Linked`, or `BackedUp -> RolledBack` when linking fails.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::Link`] after a successful rollback, or
    /// [`MergeError::RollbackFailed`] if the backup could not be restored.
    pub fn link(&mut self) -> Result<(), MergeError> {
        debug_assert_eq!(self.state, LinkState::BackedUp);
        match fs::hard_link(self.canonical, self.duplicate) {
            Ok(()) => {
                self.state = LinkState::Linked;
                log::debug!(
                    "Linked {} to {}",
                    self.canonical.display(),
                    self.duplicate.display()
                );
                Ok(())
            }
            Err(source) => {
                log::error!(
                    "Failed to link {} to {}: {}",
                    self.canonical.display(),
                    self.duplicate.display(),
                    source
                );
                if let Err(rollback) = fs::rename(&self.backup, self.duplicate) {
                    return Err(MergeError::RollbackFailed {
                        canonical: self.canonical.to_path_buf(),
                        duplicate: self.duplicate.to_path_buf(),
                        backup: self.backup.clone(),
                        source,
                        rollback,
                    });
                }
                self.state = LinkState::RolledBack;
                log::debug!("Restored {}", self.duplicate.display());
                Err(MergeError::Link {
                    canonical: self.canonical.to_path_buf(),
                    duplicate: self.duplicate.to_path_buf(),
                    source,
                })
            }
        }
    }

    /// `Linked -> Cleaned`: remove the backup.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup cannot be removed; the state stays
    /// `Linked` and the backup is left in place.
    pub fn clean(&mut self) -> Result<(), MergeError> {
        debug_assert_eq!(self.state, LinkState::Linked);
        fs::remove_file(&self.backup).map_err(|e| MergeError::Cleanup {
            duplicate: self.duplicate.to_path_buf(),
            backup: self.backup.clone(),
            source: e,
        })?;
        self.state = LinkState::Cleaned;
        Ok(())
    }

    /// Drive the transaction to a terminal state.
    ///
    /// # Errors
    ///
    /// Returns the first error of any step. A taken backup path is not an
    /// error but [`MergeOutcome::Conflict`].
    pub fn run(mut self) -> Result<MergeOutcome, MergeError> {
        if self.backup_taken()? || !self.back_up()? {
            return Ok(MergeOutcome::Conflict {
                backup: self.backup,
            });
        }
        self.link()?;
        self.clean()?;
        Ok(MergeOutcome::Linked)
    }
}

/// Replace every duplicate with a hard link to its group's main file.
///
/// A status line `"<main>" --> "<duplicate>"` is written to `out` before
/// each duplicate is attempted. Every skipped duplicate gets a line on
/// `diagnostics`, independent of the log level.
///
/// # Errors
///
/// Stops at the first error other than a conflict. Duplicates processed
/// before the error stay linked; later ones are untouched.
pub fn merge_groups<W: Write, E: Write>(
    groups: &[DuplicateGroup],
    out: &mut W,
    diagnostics: &mut E,
) -> Result<MergeSummary, MergeError> {
    let mut summary = MergeSummary::default();

    for group in groups {
        for duplicate in &group.duplicates {
            writeln!(
                out,
                "\"{}\" --> \"{}\"",
                group.main_file.display(),
                duplicate.display()
            )?;

            match LinkTransaction::new(&group.main_file, duplicate).run()? {
                MergeOutcome::Linked => {
                    summary.merged += 1;
                    summary.merged_size += group.size;
                }
                MergeOutcome::Conflict { backup } => {
                    writeln!(
                        diagnostics,
                        "Can't create temporary file for {}: {} already exists",
                        duplicate.display(),
                        backup.display()
                    )?;
                    summary.conflicts.push(duplicate.clone());
                }
            }
        }
    }

    log::info!(
        "Merged {} files ({} conflicts)",
        summary.merged,
        summary.conflicts.len()
    );

    Ok(summary)
}
