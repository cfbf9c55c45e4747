//! Plain-text listing of duplicate groups.
//!
//! Each group is written as its main file, then every duplicate on its own
//! line, then two blank lines.

use std::io::Write;

use crate::duplicates::DuplicateGroup;

/// Formatter for the plain report.
pub struct ReportOutput<'a> {
    groups: &'a [DuplicateGroup],
}

impl<'a> ReportOutput<'a> {
    /// Create a report over the given groups.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup]) -> Self {
        Self { groups }
    }

    /// Write the report.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for group in self.groups {
            for path in group.paths() {
                writeln!(writer, "{}", path.display())?;
            }
            writeln!(writer)?;
            writeln!(writer)?;
        }
        writer.flush()
    }
}
