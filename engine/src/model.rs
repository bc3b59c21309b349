//! Core data model for backup runs.
//!
//! This module defines the values that flow through a single backup pass:
//! - BackupRequest: the immutable configuration of one run
//! - TraversalNode: a source directory met during the walk
//! - CopyTask / CopyReport: one file going in, its result coming out
//! - RunOutcome: aggregate counters for the whole run

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Immutable configuration for one backup run.
///
/// Built once from invocation parameters and passed by reference to the
/// engine; nothing in the engine reads ambient or global options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRequest {
    /// Top-level directory being backed up
    pub source_root: PathBuf,

    /// Top-level directory receiving the backup
    pub dest_root: PathBuf,

    /// Copy every file directly into `dest_root`, discarding subdirectories
    pub flatten: bool,

    /// Report every action without touching the filesystem
    pub simulate: bool,

    /// Report successful actions, not only failures
    pub verbose: bool,
}

impl BackupRequest {
    /// Create a request with nested layout, live mode and quiet reporting.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(source_root: P, dest_root: Q) -> Self {
        BackupRequest {
            source_root: source_root.as_ref().to_path_buf(),
            dest_root: dest_root.as_ref().to_path_buf(),
            flatten: false,
            simulate: false,
            verbose: false,
        }
    }

    pub fn flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }

    pub fn simulate(mut self, simulate: bool) -> Self {
        self.simulate = simulate;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// A directory encountered during the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalNode {
    /// Path of the directory as found under the source root
    pub absolute_path: PathBuf,

    /// Path relative to the source root; "." for the root itself
    pub relative_path: PathBuf,
}

impl TraversalNode {
    /// Build a node for `path`, which must lie under `source_root`.
    pub fn new(source_root: &Path, path: &Path) -> Self {
        let relative_path = match path.strip_prefix(source_root) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel.to_path_buf(),
            _ => PathBuf::from("."),
        };
        TraversalNode {
            absolute_path: path.to_path_buf(),
            relative_path,
        }
    }

    /// True for the source root itself.
    pub fn is_root(&self) -> bool {
        self.relative_path == Path::new(".")
    }
}

/// One file to back up, with the destination the planner chose for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyTask {
    pub source_file: PathBuf,
    pub planned_dest_file: PathBuf,
}

/// Result category of a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStatus {
    /// Copied under its planned name
    Copied,
    /// Copied under a timestamp-disambiguated name
    Renamed,
    /// Content copy failed; nothing usable was written
    Failed,
    /// Dry run: would be copied under its planned name
    PlannedCopy,
    /// Dry run: would be copied under a disambiguated name
    PlannedRename,
}

impl CopyStatus {
    /// True if the file was (or would be) written under a new name.
    pub fn is_rename(&self) -> bool {
        matches!(self, CopyStatus::Renamed | CopyStatus::PlannedRename)
    }

    /// True for dry-run statuses.
    pub fn is_planned(&self) -> bool {
        matches!(self, CopyStatus::PlannedCopy | CopyStatus::PlannedRename)
    }
}

impl std::fmt::Display for CopyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CopyStatus::Copied | CopyStatus::PlannedCopy => write!(f, "COPY"),
            CopyStatus::Renamed | CopyStatus::PlannedRename => write!(f, "RENAME"),
            CopyStatus::Failed => write!(f, "ERROR"),
        }
    }
}

/// What the Copy Executor did with one CopyTask.
#[derive(Debug, Clone)]
pub struct CopyReport {
    /// Source file
    pub source: PathBuf,

    /// Destination chosen by the planner, before collision resolution
    pub planned_destination: PathBuf,

    /// Destination actually used (or that would be used in a dry run)
    pub destination: PathBuf,

    pub status: CopyStatus,

    /// Bytes written (0 for dry runs and failures)
    pub bytes: u64,

    /// Human-readable cause if status is Failed
    pub error_message: Option<String>,

    /// Metadata that could not be carried over (content copy still succeeded)
    pub metadata_warnings: Vec<String>,
}

/// How a destination directory was handled during the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryAction {
    /// Directory did not exist and was created
    Created,
    /// Directory was already present
    Existing,
    /// Dry run: directory would be ensured
    Planned,
}

/// Aggregate result of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Files copied under their original name
    pub files_copied: u64,
    /// Files copied under a disambiguated name
    pub files_renamed: u64,
    pub files_failed: u64,
    pub planned_copies: u64,
    pub planned_renames: u64,

    pub directories_created: u64,
    pub directories_planned: u64,
    /// Subdirectories that could not be enumerated
    pub directories_failed: u64,

    pub bytes_copied: u64,
    pub metadata_warnings: u64,
}

impl RunOutcome {
    pub fn new(dry_run: bool) -> Self {
        RunOutcome {
            run_id: Uuid::new_v4(),
            dry_run,
            started_at: Utc::now(),
            finished_at: None,
            files_copied: 0,
            files_renamed: 0,
            files_failed: 0,
            planned_copies: 0,
            planned_renames: 0,
            directories_created: 0,
            directories_planned: 0,
            directories_failed: 0,
            bytes_copied: 0,
            metadata_warnings: 0,
        }
    }

    /// Fold one file result into the counters.
    pub fn record_file(&mut self, report: &CopyReport) {
        match report.status {
            CopyStatus::Copied => self.files_copied += 1,
            CopyStatus::Renamed => self.files_renamed += 1,
            CopyStatus::Failed => self.files_failed += 1,
            CopyStatus::PlannedCopy => self.planned_copies += 1,
            CopyStatus::PlannedRename => self.planned_renames += 1,
        }
        self.bytes_copied += report.bytes;
        self.metadata_warnings += report.metadata_warnings.len() as u64;
    }

    pub fn record_directory(&mut self, action: DirectoryAction) {
        match action {
            DirectoryAction::Created => self.directories_created += 1,
            DirectoryAction::Planned => self.directories_planned += 1,
            DirectoryAction::Existing => {}
        }
    }

    /// Every file the walk reached, whatever happened to it.
    pub fn files_visited(&self) -> u64 {
        self.files_copied
            + self.files_renamed
            + self.files_failed
            + self.planned_copies
            + self.planned_renames
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(status: CopyStatus, bytes: u64) -> CopyReport {
        CopyReport {
            source: PathBuf::from("/src/a.txt"),
            planned_destination: PathBuf::from("/dst/a.txt"),
            destination: PathBuf::from("/dst/a.txt"),
            status,
            bytes,
            error_message: None,
            metadata_warnings: Vec::new(),
        }
    }

    #[test]
    fn test_traversal_node_root_is_dot() {
        let node = TraversalNode::new(Path::new("/src"), Path::new("/src"));
        assert_eq!(node.relative_path, PathBuf::from("."));
        assert!(node.is_root());
    }

    #[test]
    fn test_traversal_node_nested_relative_path() {
        let node = TraversalNode::new(Path::new("/src"), Path::new("/src/a/b"));
        assert_eq!(node.relative_path, PathBuf::from("a/b"));
        assert!(!node.is_root());
    }

    #[test]
    fn test_request_builder_defaults() {
        let request = BackupRequest::new("/src", "/dst");
        assert!(!request.flatten);
        assert!(!request.simulate);
        assert!(!request.verbose);

        let request = request.flatten(true).simulate(true).verbose(true);
        assert!(request.flatten && request.simulate && request.verbose);
    }

    #[test]
    fn test_outcome_counts_by_status() {
        let mut outcome = RunOutcome::new(false);
        outcome.record_file(&report(CopyStatus::Copied, 5));
        outcome.record_file(&report(CopyStatus::Renamed, 7));
        outcome.record_file(&report(CopyStatus::Failed, 0));

        assert_eq!(outcome.files_copied, 1);
        assert_eq!(outcome.files_renamed, 1);
        assert_eq!(outcome.files_failed, 1);
        assert_eq!(outcome.bytes_copied, 12);
        assert_eq!(outcome.files_visited(), 3);
    }

    #[test]
    fn test_outcome_ignores_existing_directories() {
        let mut outcome = RunOutcome::new(false);
        outcome.record_directory(DirectoryAction::Existing);
        outcome.record_directory(DirectoryAction::Created);
        assert_eq!(outcome.directories_created, 1);
        assert_eq!(outcome.directories_planned, 0);
    }
}
