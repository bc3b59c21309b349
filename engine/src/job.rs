//! Backup orchestration.
//!
//! This module drives one backup run:
//! - validating the source root
//! - preparing the destination root
//! - walking the source tree, ensuring destination directories level by
//!   level and handing every file to the Copy Executor
//!
//! Precondition failures abort before anything is written. Per-file failures
//! are recorded and the walk continues. There is no rollback: a run that
//! stops early (fatal error or interruption) leaves the destination as it was
//! at that moment.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, span, warn, Level};
use walkdir::{DirEntry, WalkDir};

use crate::error::EngineError;
use crate::executor;
use crate::fs_ops;
use crate::model::{BackupRequest, DirectoryAction, RunOutcome, TraversalNode};
use crate::planner;
use crate::progress::ProgressCallback;

/// Check that the source root exists and is a directory.
///
/// # Errors
/// `SourceNotFound`, `SourceNotDirectory`, or `SourceAccessDenied` when the
/// source cannot be inspected.
pub fn validate_source(request: &BackupRequest) -> Result<(), EngineError> {
    let source = &request.source_root;
    match fs::metadata(source) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(EngineError::SourceNotDirectory {
            path: source.clone(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(EngineError::SourceNotFound {
            path: source.clone(),
        }),
        Err(e) => Err(EngineError::SourceAccessDenied {
            path: source.clone(),
            source: e,
        }),
    }
}

/// Make sure the destination root exists, or in a dry run that it could.
///
/// # Errors
/// `DestinationUnavailable` if the root exists as a non-directory or cannot
/// be created.
pub fn prepare_destination(request: &BackupRequest) -> Result<DirectoryAction, EngineError> {
    let dest = &request.dest_root;

    if request.simulate {
        return match fs::metadata(dest) {
            Ok(metadata) if metadata.is_dir() => Ok(DirectoryAction::Existing),
            Ok(_) => Err(EngineError::DestinationUnavailable {
                path: dest.clone(),
                source: io::Error::new(io::ErrorKind::AlreadyExists, "not a directory"),
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(DirectoryAction::Planned),
            Err(e) => Err(EngineError::DestinationUnavailable {
                path: dest.clone(),
                source: e,
            }),
        };
    }

    match fs_ops::ensure_dir(dest) {
        Ok(true) => Ok(DirectoryAction::Created),
        Ok(false) => Ok(DirectoryAction::Existing),
        Err(EngineError::DirectoryCreationFailed { path, source }) => {
            Err(EngineError::DestinationUnavailable { path, source })
        }
        Err(e) => Err(e),
    }
}

/// Run a backup described by `request`.
///
/// The cancellation flag is checked before every walk entry; once it is set
/// the run stops with `EngineError::Interrupted`.
///
/// # Errors
/// Returns EngineError for precondition failures, an unreadable source root,
/// a nested destination directory that cannot be created, or interruption.
/// Per-file failures are reported through the callback and counted in the
/// returned RunOutcome.
pub fn run_backup(
    request: &BackupRequest,
    progress_callback: Option<&dyn ProgressCallback>,
    cancel: &AtomicBool,
) -> Result<RunOutcome, EngineError> {
    let mut outcome = RunOutcome::new(request.simulate);
    let span = span!(Level::INFO, "backup", run_id = %outcome.run_id);
    let _enter = span.enter();

    validate_source(request)?;

    let action = prepare_destination(request)?;
    outcome.record_directory(action);
    if let Some(callback) = progress_callback {
        callback.on_destination_ready(request, action);
    }

    info!(
        source = %request.source_root.display(),
        destination = %request.dest_root.display(),
        flatten = request.flatten,
        dry_run = request.simulate,
        "backup started"
    );

    walk(request, progress_callback, cancel, &mut outcome)?;

    outcome.finish();
    info!(
        copied = outcome.files_copied,
        renamed = outcome.files_renamed,
        failed = outcome.files_failed,
        planned = outcome.planned_copies + outcome.planned_renames,
        directories = outcome.directories_created,
        bytes = outcome.bytes_copied,
        "backup finished"
    );

    if let Some(callback) = progress_callback {
        callback.on_run_completed(&outcome);
    }
    Ok(outcome)
}

fn walk(
    request: &BackupRequest,
    progress_callback: Option<&dyn ProgressCallback>,
    cancel: &AtomicBool,
    outcome: &mut RunOutcome,
) -> Result<(), EngineError> {
    // Present only when the destination exists; used to prune it from the walk.
    let dest_marker = fs::canonicalize(&request.dest_root).ok();

    let walker = WalkDir::new(&request.source_root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_destination(entry, dest_marker.as_deref()));

    // Destinations handed out so far in a dry run, where nothing lands on disk.
    let mut planned: HashSet<PathBuf> = HashSet::new();

    for entry in walker {
        if cancel.load(Ordering::SeqCst) {
            warn!("backup interrupted");
            return Err(EngineError::Interrupted);
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| request.source_root.clone());
                if err.depth() == 0 {
                    return Err(EngineError::EnumerationFailed {
                        path,
                        source: io::Error::from(err),
                    });
                }
                let message = err
                    .io_error()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| err.to_string());
                warn!(path = %path.display(), error = %message, "skipping unreadable directory");
                outcome.directories_failed += 1;
                if let Some(callback) = progress_callback {
                    callback.on_directory_failed(&path, &message);
                }
                continue;
            }
        };

        if entry.file_type().is_dir() {
            visit_directory(request, &entry, progress_callback, outcome)?;
            continue;
        }

        if entry.file_type().is_symlink() && entry.path().is_dir() {
            debug!(path = %entry.path().display(), "not following directory symlink");
            continue;
        }

        let task = planner::plan_copy(request, entry.path());
        let report = executor::execute(&task, request.simulate, &mut planned);
        outcome.record_file(&report);
        if let Some(callback) = progress_callback {
            callback.on_file(&report);
        }
    }

    Ok(())
}

/// Ensure-directory phase for one source directory.
fn visit_directory(
    request: &BackupRequest,
    entry: &DirEntry,
    progress_callback: Option<&dyn ProgressCallback>,
    outcome: &mut RunOutcome,
) -> Result<(), EngineError> {
    let node = TraversalNode::new(&request.source_root, entry.path());

    // Root maps to dest_root, handled by prepare_destination; flatten never nests.
    if node.is_root() || request.flatten {
        debug!(path = %node.absolute_path.display(), "entering directory");
        return Ok(());
    }

    let target: PathBuf = planner::target_dir(&request.dest_root, &node.relative_path, false);
    let action = if request.simulate {
        if target.is_dir() {
            DirectoryAction::Existing
        } else {
            DirectoryAction::Planned
        }
    } else if fs_ops::ensure_dir(&target)? {
        DirectoryAction::Created
    } else {
        DirectoryAction::Existing
    };

    debug!(
        source = %node.absolute_path.display(),
        target = %target.display(),
        ?action,
        "directory ensured"
    );
    outcome.record_directory(action);
    if let Some(callback) = progress_callback {
        callback.on_directory(&node, &target, action);
    }
    Ok(())
}

/// True for a directory below the source root that is the destination root itself.
fn is_destination(entry: &DirEntry, dest_marker: Option<&Path>) -> bool {
    let Some(dest) = dest_marker else {
        return false;
    };
    entry.depth() > 0
        && entry.file_type().is_dir()
        && fs::canonicalize(entry.path()).map_or(false, |path| path == dest)
}
