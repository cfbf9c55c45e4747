//! Writers for duplicate scan results.
//!
//! This module provides the two non-mutating ways to apply a scan:
//! - [`report`]: a plain listing of each group
//! - [`script`]: a reviewable shell script that performs the merge
//!
//! # Example
//!
//! ```no_run
//! use fdedup::duplicates::DuplicateFinder;
//! use fdedup::output::ReportOutput;
//! use fdedup::scanner::FilesystemAccessor;
//! use std::path::Path;
//!
//! let accessor = FilesystemAccessor::new(Path::new("."));
//! let finder = DuplicateFinder::with_defaults();
//! let (groups, _stat) = finder.find_duplicates(&accessor).unwrap();
//!
//! ReportOutput::new(&groups)
//!     .write_to(&mut std::io::stdout())
//!     .unwrap();
//! ```

pub mod report;
pub mod script;

pub use report::ReportOutput;
pub use script::{ScriptOutput, ScriptType};
