//! fdedup - duplicate file finder and hard-link consolidator
//!
//! Finds byte-identical files under a directory tree and either lists them,
//! prints a script that merges them, or replaces every duplicate with a hard
//! link to one canonical copy.
//!
//! The pipeline is:
//! 1. [`scanner`]: a [`scanner::ContentAccessor`] enumerates files and
//!    answers content questions (real filesystem or in memory)
//! 2. [`duplicates`]: size grouping, BLAKE3 fingerprint grouping and byte
//!    comparison with reprocessing of fingerprint collisions
//! 3. [`output`] / [`actions`]: report, merge script, or in-place merge

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::actions::merge_groups;
use crate::cli::{ApplyMode, Cli};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, FinderConfig};
use crate::error::ExitCode;
use crate::output::{ReportOutput, ScriptOutput};
use crate::progress::Progress;
use crate::scanner::FilesystemAccessor;

/// Run fdedup for parsed command-line arguments.
///
/// Prints the report or script to stdout and the run summary to stderr.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the scan fails, or the
/// merge stops on a filesystem error.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let mut config =
        Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.apply_cli(&cli);
    config.validate()?;
    log::debug!("Effective configuration: {:?}", config);

    let accessor = FilesystemAccessor::new(&cli.path);
    let mut finder_config = FinderConfig::default()
        .with_size_range(config.min_size, config.max_size)
        .with_io_threads(config.io_threads);
    if config.progress {
        finder_config = finder_config.with_progress_callback(Arc::new(Progress::new(false)));
    }

    let (groups, stat) = DuplicateFinder::new(finder_config)
        .find_duplicates(&accessor)
        .with_context(|| format!("Failed to scan {}", cli.path.display()))?;
    log::info!("Found {} duplicate groups", groups.len());

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let outcome = match config.apply {
        ApplyMode::Report => ReportOutput::new(&groups)
            .write_to(&mut out)
            .context("Failed to write report")
            .map(|()| ExitCode::Success),
        ApplyMode::Plan => ScriptOutput::new(&groups, &stat, cli.script_type())
            .write_to(&mut out)
            .context("Failed to write merge script")
            .map(|()| ExitCode::Success),
        ApplyMode::Merge => merge_groups(&groups, &mut out, &mut io::stderr())
            .context("Merge stopped")
            .and_then(|summary| {
                out.flush()?;
                if summary.has_conflicts() {
                    log::warn!(
                        "{} duplicates were skipped because their backup path exists",
                        summary.conflicts.len()
                    );
                    Ok(ExitCode::PartialSuccess)
                } else {
                    Ok(ExitCode::Success)
                }
            }),
    };

    if !cli.quiet {
        eprintln!("{}", stat);
    }

    outcome
}
