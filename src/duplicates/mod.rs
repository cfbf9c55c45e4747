//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based file grouping (Phase 1)
//! - Fingerprint grouping (Phase 2)
//! - Canonical selection and byte comparison (Phase 3)
//! - Duplicate group and statistics types

pub mod finder;
pub mod groups;

pub use finder::{
    find_duplicates, DuplicateFinder, FinderConfig, FinderError, DEFAULT_MAX_SIZE,
    DEFAULT_MIN_SIZE,
};
pub use groups::{DupStat, DuplicateGroup, HashGroup, SizeGroup, SUMMARY_UNIT};
