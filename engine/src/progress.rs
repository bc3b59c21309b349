//! Progress reporting trait.
//!
//! This module defines the ProgressCallback trait, which decouples the
//! backup engine from how actions are shown to the user. The engine reports
//! every event; front ends decide what to print (the CLI hides successful
//! actions unless `--verbose` is set, and always shows failures).

use std::path::Path;

use crate::model::{BackupRequest, CopyReport, DirectoryAction, RunOutcome, TraversalNode};

/// Receives events from a backup run.
///
/// All methods are called synchronously, in walk order, from the thread
/// running the backup. Every method has an empty default so implementors
/// only override what they display.
pub trait ProgressCallback {
    /// Destination root exists (or, in a dry run, would be created).
    fn on_destination_ready(&self, _request: &BackupRequest, _action: DirectoryAction) {}

    /// A destination directory for `node` was ensured or planned.
    fn on_directory(&self, _node: &TraversalNode, _target: &Path, _action: DirectoryAction) {}

    /// A source subdirectory could not be listed; its contents are skipped.
    fn on_directory_failed(&self, _path: &Path, _message: &str) {}

    /// A file was copied, planned or failed.
    fn on_file(&self, _report: &CopyReport) {}

    /// The walk finished without a fatal error.
    fn on_run_completed(&self, _outcome: &RunOutcome) {}
}
