//! Shell script generation for the hard-link merge.
//!
//! The generated script performs the same steps as an in-process merge so
//! the user can review it before anything changes on disk.
//!
//! # Features
//!
//! * **Multi-platform**: POSIX shell scripts (Unix) and PowerShell (Windows).
//! * **Dry run by default**: nothing is touched unless the script is run
//!   with `--confirm`.
//! * **Same safety steps as the merge**: each duplicate is moved to a
//!   `.fdup-bak` backup, replaced with a link, and the backup removed. A
//!   taken backup path skips the duplicate; a failed link restores it.
//! * **Escaping**: handles spaces, quotes, and special characters in paths.
//!
//! # Usage
//!
//! ```rust,ignore
//! use fdedup::output::script::{ScriptOutput, ScriptType};
//!
//! let output = ScriptOutput::new(&groups, &stat, ScriptType::detect());
//! output.write_to(&mut std::io::stdout()).unwrap();
//! ```

use std::io::Write;
use std::path::Path;

use crate::actions::merge::backup_path;
use crate::duplicates::{DupStat, DuplicateGroup};

/// Type of script to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptType {
    /// POSIX-compliant shell script (sh/bash/zsh)
    Posix,
    /// Windows PowerShell script
    PowerShell,
}

impl ScriptType {
    /// Detect the appropriate script type for the current platform.
    #[must_use]
    pub fn detect() -> Self {
        if cfg!(windows) {
            Self::PowerShell
        } else {
            Self::Posix
        }
    }
}

/// Formatter for shell script output.
pub struct ScriptOutput<'a> {
    /// Duplicate groups to include in the script
    pub groups: &'a [DuplicateGroup],
    /// Run statistics for the header
    pub stat: &'a DupStat,
    /// The type of script to generate
    pub script_type: ScriptType,
}

impl<'a> ScriptOutput<'a> {
    /// Create a new script output formatter.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup], stat: &'a DupStat, script_type: ScriptType) -> Self {
        Self {
            groups,
            stat,
            script_type,
        }
    }

    /// Write the generated script to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        match self.script_type {
            ScriptType::Posix => self.write_posix(writer)?,
            ScriptType::PowerShell => self.write_powershell(writer)?,
        }
        writer.flush()
    }

    fn write_header<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "# fdedup hard-link merge script")?;
        writeln!(
            writer,
            "# Generated on: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(writer, "#")?;
        writeln!(
            writer,
            "# Each duplicate is replaced by a hard link to its main file."
        )?;
        writeln!(writer, "# Please review carefully before executing.")?;
        writeln!(writer, "#")?;
        writeln!(
            writer,
            "# Total duplicates found: {}",
            self.stat.duplicate_amount
        )?;
        writeln!(
            writer,
            "# Reclaimable space: {}",
            bytesize::ByteSize::b(self.stat.duplicate_size)
        )?;
        writeln!(writer)
    }

    fn write_posix<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "#!/bin/sh")?;
        self.write_header(writer)?;

        writeln!(writer, "DRY_RUN=1")?;
        writeln!(writer, "if [ \"$1\" = \"--confirm\" ]; then")?;
        writeln!(writer, "    DRY_RUN=0")?;
        writeln!(writer, "fi")?;
        writeln!(writer)?;
        writeln!(writer, "if [ \"$DRY_RUN\" -eq 1 ]; then")?;
        writeln!(writer, "    echo \"DRY RUN MODE. No files will be changed.\"")?;
        writeln!(
            writer,
            "    echo \"Run with --confirm to actually link files.\""
        )?;
        writeln!(writer, "    echo")?;
        writeln!(writer, "fi")?;
        writeln!(writer)?;
        writeln!(writer, "MERGED_COUNT=0")?;
        writeln!(writer, "CONFLICT_COUNT=0")?;
        writeln!(writer)?;

        for (i, group) in self.groups.iter().enumerate() {
            let main = escape_posix(&group.main_file);
            writeln!(
                writer,
                "# Group {}: Size {}, reclaimable {}",
                i + 1,
                bytesize::ByteSize::b(group.size),
                bytesize::ByteSize::b(group.reclaimable_space())
            )?;
            writeln!(writer, "# KEEP:   {}", main)?;

            for duplicate in &group.duplicates {
                let dup = escape_posix(duplicate);
                let bak = escape_posix(&backup_path(duplicate));

                writeln!(writer, "# LINK:   {}", dup)?;
                writeln!(writer, "if [ -e {bak} ] || [ -L {bak} ]; then")?;
                writeln!(
                    writer,
                    "    echo \"skipping: \"{bak}\" already exists\" >&2"
                )?;
                writeln!(writer, "    CONFLICT_COUNT=$((CONFLICT_COUNT + 1))")?;
                writeln!(writer, "elif [ \"$DRY_RUN\" -eq 0 ]; then")?;
                writeln!(writer, "    mv -- {dup} {bak} || exit 1")?;
                writeln!(writer, "    if ! ln -- {main} {dup}; then")?;
                writeln!(writer, "        mv -- {bak} {dup}")?;
                writeln!(writer, "        exit 1")?;
                writeln!(writer, "    fi")?;
                writeln!(writer, "    rm -- {bak} || exit 1")?;
                writeln!(writer, "    MERGED_COUNT=$((MERGED_COUNT + 1))")?;
                writeln!(writer, "else")?;
                writeln!(writer, "    echo \"would link: \"{main}\" --> \"{dup}")?;
                writeln!(writer, "fi")?;
            }
            writeln!(writer)?;
        }

        writeln!(writer, "if [ \"$DRY_RUN\" -eq 0 ]; then")?;
        writeln!(
            writer,
            "    echo \"Merge complete. Linked $MERGED_COUNT files, $CONFLICT_COUNT conflicts.\""
        )?;
        writeln!(writer, "else")?;
        writeln!(writer, "    echo \"Dry run complete. No files were changed.\"")?;
        writeln!(writer, "fi")?;

        Ok(())
    }

    fn write_powershell<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        self.write_header(writer)?;

        writeln!(writer, "$DryRun = $true")?;
        writeln!(writer, "if ($args[0] -eq \"--confirm\") {{")?;
        writeln!(writer, "    $DryRun = $false")?;
        writeln!(writer, "}}")?;
        writeln!(writer)?;
        writeln!(writer, "if ($DryRun) {{")?;
        writeln!(
            writer,
            "    Write-Host \"DRY RUN MODE. No files will be changed.\""
        )?;
        writeln!(
            writer,
            "    Write-Host \"Run with --confirm to actually link files.\""
        )?;
        writeln!(writer, "    Write-Host \"\"")?;
        writeln!(writer, "}}")?;
        writeln!(writer)?;
        writeln!(writer, "$MergedCount = 0")?;
        writeln!(writer, "$ConflictCount = 0")?;
        writeln!(writer)?;

        for (i, group) in self.groups.iter().enumerate() {
            let main = escape_powershell(&group.main_file);
            writeln!(
                writer,
                "# Group {}: Size {}, reclaimable {}",
                i + 1,
                bytesize::ByteSize::b(group.size),
                bytesize::ByteSize::b(group.reclaimable_space())
            )?;
            writeln!(writer, "# KEEP:   {}", main)?;

            for duplicate in &group.duplicates {
                let dup = escape_powershell(duplicate);
                let bak = escape_powershell(&backup_path(duplicate));

                writeln!(writer, "# LINK:   {}", dup)?;
                writeln!(writer, "if (Test-Path -LiteralPath {bak}) {{")?;
                writeln!(
                    writer,
                    "    Write-Warning (\"skipping: \" + {bak} + \" already exists\")"
                )?;
                writeln!(writer, "    $ConflictCount++")?;
                writeln!(writer, "}} elseif (-not $DryRun) {{")?;
                writeln!(
                    writer,
                    "    Move-Item -LiteralPath {dup} -Destination {bak} -ErrorAction Stop"
                )?;
                writeln!(writer, "    try {{")?;
                writeln!(
                    writer,
                    "        New-Item -ItemType HardLink -Path {dup} -Target {main} -ErrorAction Stop | Out-Null"
                )?;
                writeln!(writer, "    }} catch {{")?;
                writeln!(
                    writer,
                    "        Move-Item -LiteralPath {bak} -Destination {dup}"
                )?;
                writeln!(writer, "        throw")?;
                writeln!(writer, "    }}")?;
                writeln!(
                    writer,
                    "    Remove-Item -LiteralPath {bak} -ErrorAction Stop"
                )?;
                writeln!(writer, "    $MergedCount++")?;
                writeln!(writer, "}} else {{")?;
                writeln!(
                    writer,
                    "    Write-Host (\"would link: \" + {main} + \" --> \" + {dup})"
                )?;
                writeln!(writer, "}}")?;
            }
            writeln!(writer)?;
        }

        writeln!(writer, "if (-not $DryRun) {{")?;
        writeln!(
            writer,
            "    Write-Host \"Merge complete. Linked $MergedCount files, $ConflictCount conflicts.\""
        )?;
        writeln!(writer, "}} else {{")?;
        writeln!(
            writer,
            "    Write-Host \"Dry run complete. No files were changed.\""
        )?;
        writeln!(writer, "}}")?;

        Ok(())
    }
}

fn escape_posix(path: &Path) -> String {
    let s = path.to_string_lossy();
    // Single quotes; embedded ' becomes '\''
    format!("'{}'", s.replace('\'', "'\\''"))
}

fn escape_powershell(path: &Path) -> String {
    let s = path.to_string_lossy();
    // Single quotes; embedded ' becomes ''
    format!("'{}'", s.replace('\'', "''"))
}
