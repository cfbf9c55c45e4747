//! Command-line interface definitions for fdedup.
//!
//! This module defines all CLI arguments and options using the clap derive
//! API. Options left unset fall through to the configuration file and the
//! `FDEDUP_*` environment variables (see [`crate::config`]).
//!
//! # Example
//!
//! ```bash
//! # List duplicates under the current directory
//! fdedup
//!
//! # Generate a reviewable merge script for ~/Photos
//! fdedup --apply plan ~/Photos > merge.sh
//!
//! # Merge duplicates between 1 MiB and 1 GiB in place
//! fdedup -m 1MiB -M 1GiB --apply merge ~/Downloads
//!
//! # Verbose mode for debugging
//! fdedup -v ~/Downloads
//! ```

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::output::ScriptType;

/// Find duplicate files and consolidate them into hard links.
///
/// fdedup groups files by size, fingerprints same-size candidates with
/// BLAKE3, confirms duplicates byte by byte, and either lists them, prints a
/// merge script, or replaces them with hard links to one canonical copy.
#[derive(Debug, Parser)]
#[command(name = "fdedup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Root directory to scan
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Minimum file size to consider (default 4KiB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(short = 'm', long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Maximum file size to consider (default 1GiB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(short = 'M', long, value_name = "SIZE", value_parser = parse_size)]
    pub max_size: Option<u64>,

    /// What to do with the duplicates found (default: report)
    #[arg(short, long, value_enum, value_name = "MODE")]
    pub apply: Option<ApplyMode>,

    /// Script flavour for `--apply plan` (default: platform)
    #[arg(long, value_enum, value_name = "TYPE")]
    pub script: Option<ScriptArg>,

    /// Number of threads used for hashing (default: 1)
    ///
    /// Higher values help on SSDs; keep 1 on spinning disks.
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Load configuration from this file instead of the default location
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Print errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

/// How to apply the duplicate groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyMode {
    /// List each group; change nothing
    #[default]
    #[value(alias = "print")]
    #[serde(alias = "print")]
    Report,
    /// Print a shell script that performs the merge
    #[value(alias = "shell")]
    #[serde(alias = "shell")]
    Plan,
    /// Replace duplicates with hard links now
    Merge,
}

impl std::fmt::Display for ApplyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplyMode::Report => write!(f, "report"),
            ApplyMode::Plan => write!(f, "plan"),
            ApplyMode::Merge => write!(f, "merge"),
        }
    }
}

/// Script flavour accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScriptArg {
    /// POSIX sh
    Posix,
    /// Windows PowerShell
    Powershell,
}

impl From<ScriptArg> for ScriptType {
    fn from(arg: ScriptArg) -> Self {
        match arg {
            ScriptArg::Posix => ScriptType::Posix,
            ScriptArg::Powershell => ScriptType::PowerShell,
        }
    }
}

impl Cli {
    /// Script type to generate: explicit choice or the platform default.
    #[must_use]
    pub fn script_type(&self) -> ScriptType {
        self.script.map_or_else(ScriptType::detect, ScriptType::from)
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use fdedup::cli::parse_size;
///
/// assert_eq!(parse_size("4096").unwrap(), 4096);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("4KiB").unwrap(), 4096);
/// assert_eq!(parse_size("1GiB").unwrap(), 0x4000_0000);
/// ```
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    // Whole numbers stay exact; fractions go through f64
    if let Ok(whole) = num_str.parse::<u64>() {
        return whole
            .checked_mul(multiplier)
            .ok_or_else(|| format!("Size too large: '{s}'"));
    }

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    Ok((num * multiplier as f64) as u64)
}
