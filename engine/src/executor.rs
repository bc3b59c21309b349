//! Copy Executor.
//!
//! Turns one CopyTask into a CopyReport. Collision resolution happens here,
//! immediately before the copy. Every per-file failure is caught at this
//! boundary and folded into the report; nothing is propagated to the walk.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::collision::{self, Resolution};
use crate::fs_ops;
use crate::model::{CopyReport, CopyStatus, CopyTask};

/// Execute `task`, or only plan it when `simulate` is set.
///
/// `planned` holds the destinations a dry run has already handed out; it is
/// consulted and extended only when simulating.
pub fn execute(task: &CopyTask, simulate: bool, planned: &mut HashSet<PathBuf>) -> CopyReport {
    execute_at(task, simulate, planned, Utc::now())
}

/// Same as [`execute`] with an explicit clock for the disambiguation suffix.
pub fn execute_at(
    task: &CopyTask,
    simulate: bool,
    planned: &mut HashSet<PathBuf>,
    now: DateTime<Utc>,
) -> CopyReport {
    if simulate {
        return simulate_at(task, planned, now);
    }

    let resolution = collision::resolve_at(&task.planned_dest_file, now);
    let renamed = resolution.is_renamed();
    let target = resolution.path().to_path_buf();
    match fs_ops::copy_file_with_metadata(&task.source_file, &target) {
        Ok(copied) => {
            let status = if renamed {
                CopyStatus::Renamed
            } else {
                CopyStatus::Copied
            };
            debug!(
                source = %task.source_file.display(),
                destination = %target.display(),
                bytes = copied.bytes,
                renamed,
                "file copied"
            );
            let mut report = report(task, resolution, status);
            report.bytes = copied.bytes;
            report.metadata_warnings = copied.metadata_warnings;
            report
        }
        Err(e) => {
            debug!(
                source = %task.source_file.display(),
                destination = %target.display(),
                error = %e,
                "file copy failed"
            );
            let mut report = report(task, resolution, CopyStatus::Failed);
            report.error_message = Some(e.to_string());
            report
        }
    }
}

/// Dry-run counterpart of the copy: same checks, no writes.
fn simulate_at(task: &CopyTask, planned: &mut HashSet<PathBuf>, now: DateTime<Utc>) -> CopyReport {
    let resolution = collision::resolve_planned(&task.planned_dest_file, now, planned);

    // A source the live run would refuse is reported the same way here
    if let Err(e) = fs_ops::source_metadata(&task.source_file) {
        let mut report = report(task, resolution, CopyStatus::Failed);
        report.error_message = Some(e.to_string());
        return report;
    }

    let status = if resolution.is_renamed() {
        CopyStatus::PlannedRename
    } else {
        CopyStatus::PlannedCopy
    };
    planned.insert(resolution.path().to_path_buf());
    report(task, resolution, status)
}

fn report(task: &CopyTask, resolution: Resolution, status: CopyStatus) -> CopyReport {
    CopyReport {
        source: task.source_file.clone(),
        planned_destination: task.planned_dest_file.clone(),
        destination: resolution.into_path(),
        status,
        bytes: 0,
        error_message: None,
        metadata_warnings: Vec::new(),
    }
}
