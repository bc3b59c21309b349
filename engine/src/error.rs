//! Error types for the backup engine.
//!
//! The primary error type is `EngineError`. Run-level variants stop a backup;
//! the file-level variants (`ReadError`, `WriteError`) are produced by the
//! filesystem layer and converted into a `CopyReport` at the Copy Executor
//! boundary, so they never abort a run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Exit status for a run stopped by the user.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Exit status for fatal precondition or traversal errors.
pub const EXIT_FATAL: i32 = 1;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Source directory does not exist
    #[error("Source directory does not exist: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// Source exists but is a file or something else
    #[error("Source is not a directory: {}", path.display())]
    SourceNotDirectory { path: PathBuf },

    /// Source could not be inspected (permissions, broken mount, ...)
    #[error("Cannot access source directory: {} ({source})", path.display())]
    SourceAccessDenied { path: PathBuf, source: io::Error },

    /// Destination root cannot be created or is not a directory
    #[error("Cannot create or access destination directory: {} ({source})", path.display())]
    DestinationUnavailable { path: PathBuf, source: io::Error },

    /// Source root could not be listed
    #[error("Failed to enumerate directory: {} ({source})", path.display())]
    EnumerationFailed { path: PathBuf, source: io::Error },

    /// A nested destination directory could not be created
    #[error("Failed to create directory: {} ({source})", path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    /// Failed to read from a source file
    #[error("{source}")]
    ReadError { path: PathBuf, source: io::Error },

    /// Failed to write a destination file
    #[error("{source}")]
    WriteError { path: PathBuf, source: io::Error },

    /// Cancellation flag was raised mid-run
    #[error("Backup interrupted by user")]
    Interrupted,
}

impl EngineError {
    /// Process exit status a front end should use when a run ends with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Interrupted => EXIT_INTERRUPTED,
            _ => EXIT_FATAL,
        }
    }

    /// True for errors detected before any file was touched.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::SourceNotFound { .. }
                | Self::SourceNotDirectory { .. }
                | Self::SourceAccessDenied { .. }
                | Self::DestinationUnavailable { .. }
        )
    }
}
