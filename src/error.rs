//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for the fdedup application.
///
/// - 0: Success (the chosen action completed, or there was nothing to do)
/// - 1: General error (nothing or only part of the work was done)
/// - 3: Partial success (merge skipped some duplicates because of conflicts)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the chosen action completed.
    Success = 0,
    /// General error: an unexpected error occurred.
    GeneralError = 1,
    /// Partial success: some duplicates were skipped.
    PartialSuccess = 3,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "FD000",
            Self::GeneralError => "FD001",
            Self::PartialSuccess => "FD003",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "FD001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Offending path, when the error concerns one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
            path: error_path(err),
        }
    }
}

/// Path carried by the first typed error in the chain, if any.
fn error_path(err: &anyhow::Error) -> Option<String> {
    use crate::actions::MergeError;
    use crate::duplicates::FinderError;
    use crate::scanner::AccessError;

    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<AccessError>() {
            return Some(e.path().display().to_string());
        }
        if let Some(FinderError::Access(e)) = cause.downcast_ref::<FinderError>() {
            return Some(e.path().display().to_string());
        }
        cause
            .downcast_ref::<MergeError>()
            .and_then(MergeError::path)
            .map(|p| p.display().to_string())
    })
}
