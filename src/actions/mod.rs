//! File actions module.
//!
//! Mutating operations applied to duplicate groups. Currently this is the
//! hard-link merge, which replaces each duplicate with a link to its
//! group's main file without ever leaving the data unreachable.
//!
//! ```no_run
//! use fdedup::actions::merge_groups;
//!
//! let summary = merge_groups(&[], &mut std::io::stdout(), &mut std::io::stderr()).unwrap();
//! assert_eq!(summary.merged, 0);
//! ```

pub mod merge;

pub use merge::{
    backup_path, merge_groups, LinkState, LinkTransaction, MergeError, MergeOutcome, MergeSummary,
    BACKUP_SUFFIX,
};
