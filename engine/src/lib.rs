//! # Backup Engine
//!
//! A headless library that backs up a directory tree into another directory.
//! Designed as the foundation for front ends (the `backup` CLI, automation).
//!
//! ## Overview
//!
//! One run walks the source tree top-down and, for every file:
//! - plans its destination (nested layout or flattened into the root)
//! - resolves collisions by inserting a UTC timestamp before the extension,
//!   never overwriting what is already there
//! - copies content, modification time and permission bits, or only reports
//!   the action in a dry run
//!
//! Per-file failures are isolated and reported; only precondition errors,
//! an unreadable source root, an uncreatable nested destination directory and
//! interruption stop a run.
//!
//! ## Basic Usage
//!
//! ```no_run
//! use std::sync::atomic::AtomicBool;
//! use engine::{run_backup, BackupRequest};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let request = BackupRequest::new("/home/me/docs", "/mnt/backup/docs").flatten(false);
//! let cancel = AtomicBool::new(false);
//!
//! let outcome = run_backup(&request, None, &cancel)?;
//! println!(
//!     "{} copied, {} renamed, {} failed",
//!     outcome.files_copied, outcome.files_renamed, outcome.files_failed
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - **model**: BackupRequest, TraversalNode, CopyTask, CopyReport, RunOutcome
//! - **error**: Error types and exit statuses
//! - **planner**: Destination path planning
//! - **collision**: Timestamp disambiguation of taken destinations
//! - **fs_ops**: Low-level filesystem operations
//! - **executor**: Per-file copy with failure isolation
//! - **job**: Run orchestration (validate, prepare, walk)
//! - **progress**: Progress callback trait

pub mod collision;
pub mod error;
pub mod executor;
pub mod fs_ops;
pub mod job;
pub mod model;
pub mod planner;
pub mod progress;

// Re-export main types and functions
pub use collision::{Resolution, TIMESTAMP_FORMAT};
pub use error::{EngineError, EXIT_FATAL, EXIT_INTERRUPTED};
pub use job::{prepare_destination, run_backup, validate_source};
pub use model::{
    BackupRequest, CopyReport, CopyStatus, CopyTask, DirectoryAction, RunOutcome, TraversalNode,
};
pub use progress::ProgressCallback;
